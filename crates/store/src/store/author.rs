use dusk_model::{Author, Book};
use tracing::instrument;

use crate::Store;
use crate::entity::Shared;
use crate::error::{ErrorKind, Result};
use crate::models::EntityRow;
use crate::query::{BookFilter, Page, Paged, Scope, SearchFilter};
use crate::store::Named;
use crate::tx::{in_read_transaction, in_transaction};

impl Store {
    #[instrument(skip(self))]
    pub async fn get_author(&self, id: i64) -> Result<Author> {
        in_read_transaction(&self.pool, async |conn| Named::Author.get(conn, id).await).await
    }

    #[instrument(skip(self))]
    pub async fn get_all_authors(&self, filter: &SearchFilter) -> Result<Page<Author>> {
        let paged = Paged::entities(Named::Author.listing(), filter)?;
        in_read_transaction(&self.pool, async |conn| {
            paged.page::<EntityRow, Author>(conn, filter.search.as_deref()).await
        })
        .await
    }

    /// Create a standalone author.
    ///
    /// Fails with [`ErrorKind::UniqueConstraint`] if the name is taken. An
    /// author that no book links to is removed by the next book mutation.
    #[instrument(skip(self, author), fields(name = %author.name))]
    pub async fn create_author(&self, author: &Author) -> Result<Author> {
        author.validate().map_err(ErrorKind::validation)?;
        let name = author.name.trim();
        let id = in_transaction(&self.pool, async |conn| Shared::Author.insert_unique(conn, name).await).await?;
        tracing::info!(id, "Created author");
        Ok(Author { id, name: name.to_string() })
    }

    /// Rename author `id` for every book linked to it.
    #[instrument(skip(self, author), fields(name = %author.name))]
    pub async fn update_author(&self, id: i64, author: &Author) -> Result<Author> {
        author.validate().map_err(ErrorKind::validation)?;
        let name = author.name.trim();
        in_transaction(&self.pool, async |conn| Named::Author.rename(conn, id, name).await).await?;
        Ok(Author { id, name: name.to_string() })
    }

    /// Delete an author no book links to any more.
    ///
    /// An author still credited on a book is [`ErrorKind::InUse`].
    #[instrument(skip(self))]
    pub async fn delete_author(&self, id: i64) -> Result<()> {
        in_transaction(&self.pool, async |conn| Named::Author.delete(conn, id).await).await?;
        tracing::info!(id, "Deleted author");
        Ok(())
    }

    /// Page through the books credited to author `id`.
    #[instrument(skip(self))]
    pub async fn get_all_books_from_author(&self, id: i64, filter: &BookFilter) -> Result<Page<Book>> {
        self.books_page(filter, Scope::Author(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, count};

    #[tokio::test]
    async fn test_get_author() {
        let (_db, store) = testing::seeded().await;
        assert_eq!(store.get_author(1).await.unwrap(), Author { id: 1, name: "Author 1".to_string() });
        let err = store.get_author(-1).await.unwrap_err();
        assert_eq!(*err, ErrorKind::DoesNotExist { entity: "author", id: -1 });
    }

    #[tokio::test]
    async fn test_get_all_authors() {
        let (_db, store) = testing::seeded().await;
        let page = store.get_all_authors(&SearchFilter::default()).await.unwrap();
        assert_eq!(page.total_count, 5);
        let names: Vec<_> = page.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Author 1", "Author 2", "Author 3", "Author 4", "Author 5"]);

        let filter = SearchFilter {
            search: Some("Author 4".to_string()),
            ..Default::default()
        };
        let page = store.get_all_authors(&filter).await.unwrap();
        assert_eq!(page.items, vec![Author { id: 4, name: "Author 4".to_string() }]);
        assert_eq!(page.search.as_deref(), Some("Author 4"));

        let filter = SearchFilter {
            sort: Some("-name".to_string()),
            limit: 2,
            ..Default::default()
        };
        let page = store.get_all_authors(&filter).await.unwrap();
        let names: Vec<_> = page.items.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, ["Author 5", "Author 4"]);
    }

    #[tokio::test]
    async fn test_get_all_authors_empty() {
        let db = crate::Database::connect_in_memory().await.unwrap();
        let store = Store::new(&db);
        let err = store.get_all_authors(&SearchFilter::default()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NoRows);
    }

    #[tokio::test]
    async fn test_create_author() {
        let (db, store) = testing::seeded().await;
        let author = store.create_author(&Author::new("  Author 6 ")).await.unwrap();
        assert_eq!(author, Author { id: 6, name: "Author 6".to_string() });
        assert_eq!(count(&db, "author").await, 6);
    }

    #[tokio::test]
    async fn test_create_author_duplicate() {
        let (_db, store) = testing::seeded().await;
        let err = store.create_author(&Author::new("Author 1")).await.unwrap_err();
        assert_eq!(
            *err,
            ErrorKind::UniqueConstraint {
                entity: "author",
                name: "Author 1".to_string()
            }
        );
        let err = store.create_author(&Author::new(" ")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_author() {
        let (_db, store) = testing::seeded().await;
        store.update_author(5, &Author::new("Ursula")).await.unwrap();
        // A direct rename is visible on every linked book.
        assert_eq!(store.get_book(3).await.unwrap().authors, vec!["Author 3", "Author 4", "Ursula"]);
        assert_eq!(store.get_book(4).await.unwrap().authors, vec!["Ursula"]);

        let err = store.update_author(1, &Author::new("Author 2")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::UniqueConstraint { .. }));
        let err = store.update_author(-1, &Author::new("Nobody")).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NoChange { entity: "author", id: -1 });
    }

    #[tokio::test]
    async fn test_delete_author() {
        let (db, store) = testing::seeded().await;
        let standalone = store.create_author(&Author::new("Author 6")).await.unwrap();
        store.delete_author(standalone.id).await.unwrap();
        assert_eq!(count(&db, "author").await, 5);

        let err = store.delete_author(standalone.id).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NoChange { entity: "author", id: standalone.id });
    }

    #[tokio::test]
    async fn test_delete_author_of_existing_book() {
        let (db, store) = testing::seeded().await;
        let err = store.delete_author(1).await.unwrap_err();
        assert_eq!(*err, ErrorKind::InUse { entity: "author", id: 1 });
        assert_eq!(count(&db, "author").await, 5);
        assert_eq!(store.get_book(1).await.unwrap().authors, vec!["Author 1"]);
    }

    #[tokio::test]
    async fn test_get_all_books_from_author() {
        let (_db, store) = testing::seeded().await;
        let page = store.get_all_books_from_author(5, &BookFilter::default()).await.unwrap();
        let titles: Vec<_> = page.items.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Book 3", "Book 4"]);
        assert_eq!(page.total_count, 2);

        // Scope and filter combine.
        let filter = BookFilter {
            title: Some("Book 4".to_string()),
            ..Default::default()
        };
        let page = store.get_all_books_from_author(5, &filter).await.unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 4);

        let err = store.get_all_books_from_author(-1, &BookFilter::default()).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NoRows);
    }

    #[tokio::test]
    async fn test_standalone_author_is_swept_by_next_book_mutation() {
        let (db, store) = testing::seeded().await;
        store.create_author(&Author::new("Author 6")).await.unwrap();
        assert_eq!(count(&db, "author").await, 6);
        store.delete_book(1).await.unwrap();
        // Author 1 (only on Book 1) and the standalone Author 6 are both gone.
        assert_eq!(count(&db, "author").await, 4);
    }
}
