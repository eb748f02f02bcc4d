use dusk_model::Book;
use sqlx::SqliteConnection;
use tracing::instrument;

use crate::Store;
use crate::entity::Exclusive;
use crate::error::{ErrorKind, Result, classify};
use crate::link::Link;
use crate::models::{BookRow, date_to_timestamp};
use crate::query::{BookFilter, Page, Paged, Scope};
use crate::store::series::sync_book_series;
use crate::sweep::collect_orphans;
use crate::tx::{in_read_transaction, in_transaction};

impl Store {
    #[instrument(skip(self))]
    pub async fn get_book(&self, id: i64) -> Result<Book> {
        in_read_transaction(&self.pool, async |conn| fetch_book(conn, id).await).await
    }

    /// Page through all books, optionally filtered. Zero matches is [`ErrorKind::NoRows`].
    #[instrument(skip(self))]
    pub async fn get_all_books(&self, filter: &BookFilter) -> Result<Page<Book>> {
        self.books_page(filter, Scope::All).await
    }

    pub(crate) async fn books_page(&self, filter: &BookFilter, scope: Scope) -> Result<Page<Book>> {
        let paged = Paged::books(filter, scope)?;
        in_read_transaction(&self.pool, async |conn| {
            paged.page::<BookRow, Book>(conn, filter.search.as_deref()).await
        })
        .await
    }

    /// Validate and insert `book` with all of its satellite values.
    ///
    /// The `id`, `date_added` and `date_updated` of the input are ignored.
    #[instrument(skip(self, book), fields(title = %book.title))]
    pub async fn create_book(&self, book: &Book) -> Result<Book> {
        book.validate().map_err(ErrorKind::validation)?;
        let created = in_transaction(&self.pool, async |conn| {
            let id = insert_book(conn, book).await?;
            sync_satellites(conn, id, book).await?;
            collect_orphans(conn).await?;
            fetch_book(conn, id).await
        })
        .await?;
        tracing::info!(id = created.id, "Created book");
        Ok(created)
    }

    /// Replace book `id` with `book`: scalar fields and every satellite list.
    ///
    /// Shared authors and tags are never renamed in place: a changed name is
    /// linked as a different row and the old one is swept once unused.
    #[instrument(skip(self, book), fields(title = %book.title))]
    pub async fn update_book(&self, id: i64, book: &Book) -> Result<Book> {
        book.validate().map_err(ErrorKind::validation)?;
        let updated = in_transaction(&self.pool, async |conn| {
            update_book_row(conn, id, book).await?;
            sync_satellites(conn, id, book).await?;
            collect_orphans(conn).await?;
            fetch_book(conn, id).await
        })
        .await?;
        tracing::info!(id, "Updated book");
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_book(&self, id: i64) -> Result<()> {
        in_transaction(&self.pool, async |conn| {
            delete_book_row(conn, id).await?;
            collect_orphans(conn).await?;
            Ok(())
        })
        .await?;
        tracing::info!(id, "Deleted book");
        Ok(())
    }

    /// Delete several books at once. Either all of them go or none does.
    #[instrument(skip(self))]
    pub async fn delete_books(&self, ids: &[i64]) -> Result<()> {
        in_transaction(&self.pool, async |conn| {
            for id in ids {
                delete_book_row(conn, *id).await?;
            }
            collect_orphans(conn).await?;
            Ok(())
        })
        .await?;
        tracing::info!(count = ids.len(), "Deleted books");
        Ok(())
    }
}

// ============================================================================
// Statements
// ============================================================================

async fn fetch_book(conn: &mut SqliteConnection, id: i64) -> Result<Book> {
    let row: Option<BookRow> = sqlx::query_as("SELECT * FROM book_view WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| classify(e, "book", "select", None, None))?;
    match row {
        Some(row) => Book::try_from(row),
        None => exn::bail!(ErrorKind::DoesNotExist { entity: "book", id }),
    }
}

async fn insert_book(conn: &mut SqliteConnection, book: &Book) -> Result<i64> {
    sqlx::query_scalar(
        r#"
            INSERT INTO book (
                title, subtitle, num_of_pages, progress, rating, publisher, date_published,
                description, notes, cover, date_started, date_completed
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
        "#,
    )
    .bind(book.title.trim())
    .bind(book.subtitle.as_deref())
    .bind(i64::from(book.num_of_pages))
    .bind(i64::from(book.progress))
    .bind(i64::from(book.rating))
    .bind(book.publisher.as_deref())
    .bind(date_to_timestamp(book.date_published))
    .bind(book.description.as_deref())
    .bind(book.notes.as_deref())
    .bind(book.cover.as_deref())
    .bind(date_to_timestamp(book.date_started))
    .bind(date_to_timestamp(book.date_completed))
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| classify(e, "book", "insert", None, None))
}

async fn update_book_row(conn: &mut SqliteConnection, id: i64, book: &Book) -> Result<()> {
    let result = sqlx::query(
        r#"
            UPDATE book SET
                title = ?, subtitle = ?, num_of_pages = ?, progress = ?, rating = ?, publisher = ?,
                date_published = ?, description = ?, notes = ?, cover = ?, date_started = ?,
                date_completed = ?, date_updated = unixepoch()
            WHERE id = ?
        "#,
    )
    .bind(book.title.trim())
    .bind(book.subtitle.as_deref())
    .bind(i64::from(book.num_of_pages))
    .bind(i64::from(book.progress))
    .bind(i64::from(book.rating))
    .bind(book.publisher.as_deref())
    .bind(date_to_timestamp(book.date_published))
    .bind(book.description.as_deref())
    .bind(book.notes.as_deref())
    .bind(book.cover.as_deref())
    .bind(date_to_timestamp(book.date_started))
    .bind(date_to_timestamp(book.date_completed))
    .bind(id)
    .execute(&mut *conn)
    .await
    .map_err(|e| classify(e, "book", "update", None, None))?;
    if result.rows_affected() == 0 {
        exn::bail!(ErrorKind::NoChange { entity: "book", id });
    }
    Ok(())
}

async fn delete_book_row(conn: &mut SqliteConnection, id: i64) -> Result<()> {
    // Links and satellite rows go with it through ON DELETE CASCADE.
    let result = sqlx::query("DELETE FROM book WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await
        .map_err(|e| classify(e, "book", "delete", None, None))?;
    if result.rows_affected() == 0 {
        exn::bail!(ErrorKind::NoChange { entity: "book", id });
    }
    Ok(())
}

async fn sync_satellites(conn: &mut SqliteConnection, id: i64, book: &Book) -> Result<()> {
    Link::Author.sync(conn, id, &book.authors).await?;
    Link::Tag.sync(conn, id, &book.tags).await?;
    Exclusive::Isbn10.sync(conn, id, &book.isbn10).await?;
    Exclusive::Isbn13.sync(conn, id, &book.isbn13).await?;
    Exclusive::Format.sync(conn, id, &book.formats).await?;
    sync_book_series(conn, id, book.series.as_deref()).await?;
    Ok(())
}
