use dusk_model::{Book, Series};
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::Store;
use crate::entity::Shared;
use crate::error::{ErrorKind, Result, classify};
use crate::models::EntityRow;
use crate::query::{BookFilter, Page, Paged, Scope, SearchFilter};
use crate::store::Named;
use crate::tx::{in_read_transaction, in_transaction};

impl Store {
    #[instrument(skip(self))]
    pub async fn get_series(&self, id: i64) -> Result<Series> {
        in_read_transaction(&self.pool, async |conn| Named::Series.get(conn, id).await).await
    }

    #[instrument(skip(self))]
    pub async fn get_all_series(&self, filter: &SearchFilter) -> Result<Page<Series>> {
        let paged = Paged::entities(Named::Series.listing(), filter)?;
        in_read_transaction(&self.pool, async |conn| {
            paged.page::<EntityRow, Series>(conn, filter.search.as_deref()).await
        })
        .await
    }

    /// Create a series owned by book `book_id`, replacing the series the
    /// book had before.
    ///
    /// Series names are unique across the catalog: an existing name is
    /// [`ErrorKind::UniqueConstraint`], whichever book owns it, and the book
    /// keeps its previous series.
    #[instrument(skip(self, series), fields(name = %series.name))]
    pub async fn create_series(&self, book_id: i64, series: &Series) -> Result<Series> {
        series.validate().map_err(ErrorKind::validation)?;
        let name = series.name.trim();
        let id = in_transaction(&self.pool, async |conn| {
            ensure_book_exists(conn, book_id).await?;
            let released = release_book_series(conn, book_id).await?;
            if released > 0 {
                tracing::debug!(book_id, released, "Replacing series");
            }
            Shared::Series { book: book_id }.insert_unique(conn, name).await
        })
        .await?;
        tracing::info!(id, book_id, "Created series");
        Ok(Series { id, name: name.to_string() })
    }

    #[instrument(skip(self, series), fields(name = %series.name))]
    pub async fn update_series(&self, id: i64, series: &Series) -> Result<Series> {
        series.validate().map_err(ErrorKind::validation)?;
        let name = series.name.trim();
        in_transaction(&self.pool, async |conn| Named::Series.rename(conn, id, name).await).await?;
        Ok(Series { id, name: name.to_string() })
    }

    /// Rename the series currently called `current`.
    #[instrument(skip(self, series), fields(name = %series.name))]
    pub async fn update_series_by_name(&self, current: &str, series: &Series) -> Result<Series> {
        series.validate().map_err(ErrorKind::validation)?;
        let name = series.name.trim();
        let id = in_transaction(&self.pool, async |conn| {
            let id: Option<i64> = sqlx::query_scalar("SELECT id FROM series WHERE name = ?")
                .bind(current)
                .fetch_optional(&mut *conn)
                .await
                .map_err(|e| classify(e, "series", "select", None, None))?;
            let Some(id) = id else {
                exn::bail!(ErrorKind::UnknownName {
                    entity: "series",
                    name: current.to_string()
                });
            };
            Named::Series.rename(conn, id, name).await?;
            Ok(id)
        })
        .await?;
        Ok(Series { id, name: name.to_string() })
    }

    /// Delete a series. Its book stays, without a series.
    #[instrument(skip(self))]
    pub async fn delete_series(&self, id: i64) -> Result<()> {
        in_transaction(&self.pool, async |conn| Named::Series.delete(conn, id).await).await?;
        tracing::info!(id, "Deleted series");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_all_books_from_series(&self, id: i64, filter: &BookFilter) -> Result<Page<Book>> {
        self.books_page(filter, Scope::Series(id)).await
    }
}

async fn ensure_book_exists(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    let found: Option<i64> = sqlx::query_scalar("SELECT id FROM book WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| classify(e, "book", "select", None, None))?;
    if found.is_none() {
        exn::bail!(ErrorKind::DoesNotExist { entity: "book", id });
    }
    Ok(())
}

async fn release_book_series(conn: &mut SqliteConnection, book: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM series WHERE book_id = ?")
        .bind(book)
        .execute(&mut *conn)
        .await
        .map_err(|e| classify(e, "series", "delete", None, None))?;
    Ok(result.rows_affected())
}

/// Point `book` at the series called `desired`, or at none.
///
/// The book's other series rows are released. A name already owned by a
/// different book keeps its owner; this book is then left without a series
/// row of its own.
pub(crate) async fn sync_book_series(conn: &mut SqliteConnection, book: i64, desired: Option<&str>) -> Result<()> {
    let desired = desired.map(str::trim).filter(|name| !name.is_empty());
    let current: Option<String> = sqlx::query_scalar("SELECT name FROM series WHERE book_id = ? ORDER BY id LIMIT 1")
        .bind(book)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| classify(e, "series", "select", None, None))?;
    if current.as_deref() == desired {
        return Ok(());
    }

    let Some(name) = desired else {
        release_book_series(conn, book).await?;
        return Ok(());
    };
    let released = sqlx::query("DELETE FROM series WHERE book_id = ? AND name != ?")
        .bind(book)
        .bind(name)
        .execute(&mut *conn)
        .await
        .map_err(|e| classify(e, "series", "delete", None, None))?
        .rows_affected();
    let id = Shared::Series { book }.insert_or_get(conn, name).await?;
    tracing::debug!(book, series = id, released, "Synchronized series");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, book1, count};

    #[tokio::test]
    async fn test_get_series() {
        let (_db, store) = testing::seeded().await;
        assert_eq!(store.get_series(1).await.unwrap(), Series { id: 1, name: "series 1".to_string() });
        let err = store.get_series(-1).await.unwrap_err();
        assert_eq!(*err, ErrorKind::DoesNotExist { entity: "series", id: -1 });
    }

    #[tokio::test]
    async fn test_get_all_series() {
        let (_db, store) = testing::seeded().await;
        let page = store.get_all_series(&SearchFilter::default()).await.unwrap();
        assert_eq!(page.items, vec![Series { id: 1, name: "series 1".to_string() }]);
        assert_eq!(page.sort, "name");
    }

    #[tokio::test]
    async fn test_get_all_series_empty() {
        let (_db, store) = testing::seeded().await;
        store.delete_series(1).await.unwrap();
        let err = store.get_all_series(&SearchFilter::default()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NoRows);
    }

    #[tokio::test]
    async fn test_create_series() {
        let (_db, store) = testing::seeded().await;
        let series = store.create_series(1, &Series::new("series 2")).await.unwrap();
        assert_eq!(store.get_book(1).await.unwrap().series.as_deref(), Some("series 2"));
        assert_eq!(store.get_series(series.id).await.unwrap().name, "series 2");

        let err = store.create_series(3, &Series::new("series 1")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UniqueConstraint { entity: "series", .. }));
        let err = store.create_series(-1, &Series::new("series 9")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::DoesNotExist { entity: "book", id: -1 });
    }

    #[tokio::test]
    async fn test_create_series_replaces_existing_series() {
        let (db, store) = testing::seeded().await;
        let series = store.create_series(2, &Series::new("series 2")).await.unwrap();
        let book = store.get_book(2).await.unwrap();
        assert_eq!(book.series.as_deref(), Some("series 2"));
        assert_eq!(count(&db, "series").await, 1);
        let err = store.get_series(1).await.unwrap_err();
        assert_eq!(*err, ErrorKind::DoesNotExist { entity: "series", id: 1 });

        let page = store.get_all_books_from_series(series.id, &BookFilter::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 2);

        // Saving the book unchanged keeps exactly the one series row.
        store.update_book(2, &book).await.unwrap();
        assert_eq!(count(&db, "series").await, 1);
        assert_eq!(store.get_book(2).await.unwrap().series.as_deref(), Some("series 2"));
    }

    #[tokio::test]
    async fn test_create_series_conflict_keeps_previous_series() {
        let (db, store) = testing::seeded().await;
        store.create_series(1, &Series::new("series 2")).await.unwrap();
        let err = store.create_series(1, &Series::new("series 1")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UniqueConstraint { entity: "series", .. }));
        assert_eq!(store.get_book(1).await.unwrap().series.as_deref(), Some("series 2"));
        assert_eq!(count(&db, "series").await, 2);
    }

    #[tokio::test]
    async fn test_update_series() {
        let (_db, store) = testing::seeded().await;
        store.update_series(1, &Series::new("The Expanse")).await.unwrap();
        assert_eq!(store.get_book(2).await.unwrap().series.as_deref(), Some("The Expanse"));

        let err = store.update_series(-1, &Series::new("Nothing")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NoChange { entity: "series", id: -1 });
    }

    #[tokio::test]
    async fn test_update_series_by_name() {
        let (_db, store) = testing::seeded().await;
        let series = store.update_series_by_name("series 1", &Series::new("Dune")).await.unwrap();
        assert_eq!(series, Series { id: 1, name: "Dune".to_string() });

        let err = store.update_series_by_name("series 1", &Series::new("Dune")).await.unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::UnknownName {
                entity: "series",
                name: "series 1".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_delete_series_keeps_book() {
        let (db, store) = testing::seeded().await;
        store.delete_series(1).await.unwrap();
        let book = store.get_book(2).await.unwrap();
        assert_eq!(book.series, None);
        assert_eq!(count(&db, "book").await, 4);
    }

    #[tokio::test]
    async fn test_get_all_books_from_series() {
        let (_db, store) = testing::seeded().await;
        let page = store.get_all_books_from_series(1, &BookFilter::default()).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].title, "Book 2");
    }

    #[tokio::test]
    async fn test_shared_series_name_stays_with_first_book() {
        let (db, store) = testing::seeded().await;
        let book = Book {
            series: Some("series 1".to_string()),
            ..book1()
        };
        let updated = store.update_book(1, &book).await.unwrap();
        // The row keeps its owner, so Book 1 does not report the series.
        assert_eq!(updated.series, None);
        assert_eq!(store.get_book(2).await.unwrap().series.as_deref(), Some("series 1"));
        assert_eq!(count(&db, "series").await, 1);
    }

    #[tokio::test]
    async fn test_changing_series_releases_old_row() {
        let (db, store) = testing::seeded().await;
        let book = Book {
            series: Some("series 2".to_string()),
            ..store.get_book(2).await.unwrap()
        };
        let updated = store.update_book(2, &book).await.unwrap();
        assert_eq!(updated.series.as_deref(), Some("series 2"));
        let names: Vec<String> = sqlx::query_scalar("SELECT name FROM series").fetch_all(db.pool()).await.unwrap();
        assert_eq!(names, vec!["series 2"]);
    }
}
