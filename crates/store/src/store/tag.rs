use dusk_model::{Book, Tag};
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
    pub async fn get_tag(&self, id: i64) -> Result<Tag> {
        in_read_transaction(&self.pool, async |conn| Named::Tag.get(conn, id).await).await
    }

    #[instrument(skip(self))]
    pub async fn get_all_tags(&self, filter: &SearchFilter) -> Result<Page<Tag>> {
        let paged = Paged::entities(Named::Tag.listing(), filter)?;
        in_read_transaction(&self.pool, async |conn| {
            paged.page::<EntityRow, Tag>(conn, filter.search.as_deref()).await
        })
        .await
    }

    /// Create a standalone tag. Fails with [`ErrorKind::UniqueConstraint`] if the name is taken.
    #[instrument(skip(self, tag), fields(name = %tag.name))]
    pub async fn create_tag(&self, tag: &Tag) -> Result<Tag> {
        tag.validate().map_err(ErrorKind::validation)?;
        let name = tag.name.trim();
        let id = in_transaction(&self.pool, async |conn| Shared::Tag.insert_unique(conn, name).await).await?;
        tracing::info!(id, "Created tag");
        Ok(Tag { id, name: name.to_string() })
    }

    #[instrument(skip(self, tag), fields(name = %tag.name))]
    pub async fn update_tag(&self, id: i64, tag: &Tag) -> Result<Tag> {
        tag.validate().map_err(ErrorKind::validation)?;
        let name = tag.name.trim();
        in_transaction(&self.pool, async |conn| Named::Tag.rename(conn, id, name).await).await?;
        Ok(Tag { id, name: name.to_string() })
    }

    /// Delete a tag, removing it from every book that had it.
    #[instrument(skip(self))]
    pub async fn delete_tag(&self, id: i64) -> Result<()> {
        in_transaction(&self.pool, async |conn| Named::Tag.delete(conn, id).await).await?;
        tracing::info!(id, "Deleted tag");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_all_books_from_tag(&self, id: i64, filter: &BookFilter) -> Result<Page<Book>> {
        self.books_page(filter, Scope::Tag(id)).await
    }
}
