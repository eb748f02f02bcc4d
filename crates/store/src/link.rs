//! Many-to-many links between books and shared entities.
//!
//! A book never edits a shared row in place. Changing a book's authors from
//! `["John Adams"]` to `["J. Adams"]` inserts (or finds) "J. Adams", links it,
//! and unlinks "John Adams"; other books keep pointing at the old row. The
//! orphan sweep removes the old row once nothing links to it.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::entity::Shared;
use crate::error::{Result, classify};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Link {
    Author,
    Tag,
}

impl Link {
    fn table(self) -> &'static str {
        match self {
            Self::Author => "book_author_link",
            Self::Tag => "book_tag_link",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Tag => "tag",
        }
    }

    fn entity(self) -> Shared {
        match self {
            Self::Author => Shared::Author,
            Self::Tag => Shared::Tag,
        }
    }

    /// Names linked to `book`, sorted.
    pub(crate) async fn names_for_book(self, conn: &mut SqliteConnection, book: i64) -> Result<Vec<String>> {
        let sql = match self {
            Self::Author => {
                "SELECT a.name FROM author a JOIN book_author_link l ON l.author = a.id WHERE l.book = ? ORDER BY a.name"
            },
            Self::Tag => "SELECT t.name FROM tag t JOIN book_tag_link l ON l.tag = t.id WHERE l.book = ? ORDER BY t.name",
        };
        sqlx::query_scalar(sql)
            .bind(book)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| classify(e, self.table(), "select", None, None))
    }

    /// Link `book` to every id in `ids`. Existing pairs are left alone.
    pub(crate) async fn link(self, conn: &mut SqliteConnection, book: i64, ids: &[i64]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("INSERT INTO {} (book, {}) ", self.table(), self.column()));
        query.push_values(ids, |mut row, id| {
            row.push_bind(book).push_bind(*id);
        });
        query.push(" ON CONFLICT DO NOTHING");
        let result = query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, self.table(), "insert", None, None))?;
        Ok(result.rows_affected())
    }

    /// Remove every link of `book` whose entity is not in `keep`.
    pub(crate) async fn unlink(self, conn: &mut SqliteConnection, book: i64, keep: &[i64]) -> Result<u64> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!("DELETE FROM {} WHERE book = ", self.table()));
        query.push_bind(book);
        if !keep.is_empty() {
            query.push(format!(" AND {} NOT IN (", self.column()));
            let mut ids = query.separated(", ");
            for id in keep {
                ids.push_bind(*id);
            }
            ids.push_unseparated(")");
        }
        let result = query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, self.table(), "delete", None, None))?;
        Ok(result.rows_affected())
    }

    /// Make the names linked to `book` equal to `desired`.
    ///
    /// Blank names are ignored and duplicates collapse. Returns `false` when
    /// the book already had exactly these names. Orphaned entities are left
    /// for [`collect_orphans`](crate::sweep::collect_orphans).
    pub(crate) async fn sync(self, conn: &mut SqliteConnection, book: i64, desired: &[String]) -> Result<bool> {
        let mut wanted: Vec<String> = desired
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();
        wanted.sort_unstable();
        wanted.dedup();

        let mut current = self.names_for_book(conn, book).await?;
        current.sort_unstable();
        current.dedup();
        if current == wanted {
            return Ok(false);
        }

        let ids = self.entity().insert_many(conn, &wanted).await?;
        let linked = self.link(conn, book, &ids).await?;
        let unlinked = self.unlink(conn, book, &ids).await?;
        tracing::debug!(table = self.table(), book, linked, unlinked, "Synchronized links");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;
    use crate::tx::in_transaction;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    async fn insert_book(db: &Database, title: &str) -> i64 {
        sqlx::query_scalar("INSERT INTO book (title) VALUES (?) RETURNING id")
            .bind(title)
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_sync_links_and_unlinks() {
        let db = Database::connect_in_memory().await.unwrap();
        let book = insert_book(&db, "Book 1").await;
        let linked = in_transaction(db.pool(), async |conn| {
            assert!(Link::Author.sync(&mut *conn, book, &names(&["B", "A", " A "])).await?);
            assert!(!Link::Author.sync(&mut *conn, book, &names(&["A", "B"])).await?);
            assert!(Link::Author.sync(&mut *conn, book, &names(&["C", "A"])).await?);
            Link::Author.names_for_book(conn, book).await
        })
        .await
        .unwrap();
        assert_eq!(linked, names(&["A", "C"]));

        // "B" lost its last link but is only removed by the sweep.
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM author WHERE name = 'B'")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_sync_to_empty_unlinks_everything() {
        let db = Database::connect_in_memory().await.unwrap();
        let book = insert_book(&db, "Book 1").await;
        let linked = in_transaction(db.pool(), async |conn| {
            Link::Tag.sync(&mut *conn, book, &names(&["tag 1", "tag 2"])).await?;
            Link::Tag.sync(&mut *conn, book, &[]).await?;
            Link::Tag.names_for_book(conn, book).await
        })
        .await
        .unwrap();
        assert!(linked.is_empty());
    }

    #[tokio::test]
    async fn test_link_is_idempotent() {
        let db = Database::connect_in_memory().await.unwrap();
        let book = insert_book(&db, "Book 1").await;
        let (first, second) = in_transaction(db.pool(), async |conn| {
            let ids = Shared::Tag.insert_many(&mut *conn, &names(&["tag 1"])).await?;
            let first = Link::Tag.link(&mut *conn, book, &ids).await?;
            let second = Link::Tag.link(conn, book, &ids).await?;
            Ok((first, second))
        })
        .await
        .unwrap();
        assert_eq!((first, second), (1, 0));
    }
}
