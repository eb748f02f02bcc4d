use dusk_model::{Author, Series, Tag};

use crate::error::Error;

/// An `{id, name}` row from `author`, `tag` or `series`.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct EntityRow {
    pub(crate) id: i64,
    pub(crate) name: String,
}
impl TryFrom<EntityRow> for Author {
    type Error = Error;
    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        Ok(Self { id: row.id, name: row.name })
    }
}
impl TryFrom<EntityRow> for Tag {
    type Error = Error;
    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        Ok(Self { id: row.id, name: row.name })
    }
}
impl TryFrom<EntityRow> for Series {
    type Error = Error;
    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        Ok(Self { id: row.id, name: row.name })
    }
}
