//! The transaction boundary of the store.

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::error::{Result, classify};

/// Run `work` inside one write transaction.
///
/// The transaction starts with `BEGIN IMMEDIATE`, so the write lock is taken
/// up front and a second writer waits in SQLite's busy handler (up to the
/// configured busy timeout) instead of failing when it upgrades a read lock.
///
/// Commits when `work` returns `Ok`, rolls back when it returns `Err`. If
/// `work` panics, the open transaction is dropped during unwinding, which
/// rolls it back before the connection is reused; the panic itself keeps
/// propagating to the caller.
pub(crate) async fn in_transaction<T, F>(pool: &SqlitePool, work: F) -> Result<T>
where
    F: AsyncFnOnce(&mut SqliteConnection) -> Result<T>,
{
    let tx = pool
        .begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(|e| classify(e, "transaction", "begin", None, None))?;
    run(tx, work).await
}

/// Run `work` inside one deferred transaction, for operations that only read.
pub(crate) async fn in_read_transaction<T, F>(pool: &SqlitePool, work: F) -> Result<T>
where
    F: AsyncFnOnce(&mut SqliteConnection) -> Result<T>,
{
    let tx = pool.begin().await.map_err(|e| classify(e, "transaction", "begin", None, None))?;
    run(tx, work).await
}

async fn run<T, F>(mut tx: Transaction<'static, Sqlite>, work: F) -> Result<T>
where
    F: AsyncFnOnce(&mut SqliteConnection) -> Result<T>,
{
    match work(&mut *tx).await {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| classify(e, "transaction", "commit", None, None))?;
            Ok(value)
        },
        Err(err) => {
            let kind: &crate::error::ErrorKind = &err;
            tracing::debug!(error = %kind, "Rolling back transaction");
            // Report the work's error, not the rollback's.
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "Rollback failed");
            }
            Err(err)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::error::ErrorKind;
    use exn::ResultExt;
    use futures::FutureExt;
    use std::panic::AssertUnwindSafe;
    use std::time::Duration;
    use tokio::sync::Notify;

    async fn count_authors(db: &Database) -> i64 {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM author").fetch_one(db.pool()).await.unwrap();
        count
    }

    async fn insert_author(conn: &mut SqliteConnection, name: &str) -> Result<()> {
        sqlx::query("INSERT INTO author (name) VALUES (?)")
            .bind(name)
            .execute(conn)
            .await
            .or_raise(|| ErrorKind::Database { table: "author", operation: "insert" })?;
        Ok(())
    }

    #[tokio::test]
    async fn test_commit_on_success() {
        let db = Database::connect_in_memory().await.unwrap();
        let value = in_transaction(db.pool(), async |conn| {
            insert_author(conn, "Ann Leckie").await?;
            Ok(42)
        })
        .await
        .unwrap();
        assert_eq!(value, 42);
        assert_eq!(count_authors(&db).await, 1);
    }

    #[tokio::test]
    async fn test_rollback_on_error() {
        let db = Database::connect_in_memory().await.unwrap();
        let err = in_transaction(db.pool(), async |conn| -> Result<()> {
            insert_author(conn, "Ann Leckie").await?;
            exn::bail!(ErrorKind::NoChange { entity: "author", id: 1 });
        })
        .await
        .unwrap_err();
        assert_eq!(*err, ErrorKind::NoChange { entity: "author", id: 1 });
        assert_eq!(count_authors(&db).await, 0);
    }

    #[tokio::test]
    async fn test_rollback_on_panic() {
        let db = Database::connect_in_memory().await.unwrap();
        let outcome = AssertUnwindSafe(in_transaction(db.pool(), async |conn| -> Result<()> {
            insert_author(conn, "Ann Leckie").await?;
            panic!("unit of work blew up");
        }))
        .catch_unwind()
        .await;
        assert!(outcome.is_err(), "the panic must reach the caller");
        assert_eq!(count_authors(&db).await, 0);

        // The connection is usable again afterwards.
        in_transaction(db.pool(), async |conn| insert_author(conn, "Becky Chambers").await)
            .await
            .unwrap();
        assert_eq!(count_authors(&db).await, 1);
    }

    #[tokio::test]
    async fn test_read_transaction_sees_committed_rows() {
        let db = Database::connect_in_memory().await.unwrap();
        in_transaction(db.pool(), async |conn| insert_author(conn, "Ann Leckie").await)
            .await
            .unwrap();
        let names: Vec<String> = in_read_transaction(db.pool(), async |conn| {
            sqlx::query_scalar("SELECT name FROM author")
                .fetch_all(conn)
                .await
                .or_raise(|| ErrorKind::Database { table: "author", operation: "select" })
        })
        .await
        .unwrap();
        assert_eq!(names, vec!["Ann Leckie".to_string()]);
    }

    #[tokio::test]
    async fn test_second_writer_waits_for_first() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::connect(dir.path().join("library.db")).await.unwrap();
        let (started, release) = (Notify::new(), Notify::new());

        let first = in_transaction(db.pool(), async |conn| {
            insert_author(&mut *conn, "Ann Leckie").await?;
            started.notify_one();
            release.notified().await;
            insert_author(conn, "Becky Chambers").await
        });
        let second = async {
            started.notified().await;
            let (result, ()) = tokio::join!(
                // Reads before writing, so a deferred transaction would hold a
                // stale snapshot by the time it asks for the write lock.
                in_transaction(db.pool(), async |conn| {
                    let seen: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM author")
                        .fetch_one(&mut *conn)
                        .await
                        .or_raise(|| ErrorKind::Database { table: "author", operation: "select" })?;
                    insert_author(conn, &format!("Author after {seen}")).await
                }),
                async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    release.notify_one();
                },
            );
            result
        };
        let (first, second) = tokio::join!(first, second);
        first.unwrap();
        second.unwrap();

        // The second writer only started once the first had committed.
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM author ORDER BY id")
            .fetch_all(db.pool())
            .await
            .unwrap();
        assert_eq!(names, ["Ann Leckie", "Becky Chambers", "Author after 2"]);
    }
}
