//! The catalog operations.
//!
//! Every public method is one transaction. Methods that touch a book also
//! run the orphan sweep before committing.

mod author;
mod book;
mod series;
mod tag;

use sqlx::{SqliteConnection, SqlitePool};

use crate::Database;
use crate::error::{Error, ErrorKind, OnUnique, Result, classify};
use crate::models::EntityRow;
use crate::query::Listing;

/// Entry point for reading and writing the catalog.
///
/// Cheap to clone: it only holds the connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    pub fn new(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

// ============================================================================
// Row operations shared by authors, tags and series
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Named {
    Author,
    Tag,
    Series,
}

impl Named {
    fn table(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Tag => "tag",
            Self::Series => "series",
        }
    }

    fn listing(self) -> Listing {
        match self {
            Self::Author => Listing::Authors,
            Self::Tag => Listing::Tags,
            Self::Series => Listing::Series,
        }
    }

    async fn get<T>(self, conn: &mut SqliteConnection, id: i64) -> Result<T>
    where
        T: TryFrom<EntityRow, Error = Error>,
    {
        let sql = match self {
            Self::Author => "SELECT id, name FROM author WHERE id = ?",
            Self::Tag => "SELECT id, name FROM tag WHERE id = ?",
            Self::Series => "SELECT id, name FROM series WHERE id = ?",
        };
        let row: Option<EntityRow> = sqlx::query_as(sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| classify(e, self.table(), "select", None, None))?;
        match row {
            Some(row) => T::try_from(row),
            None => exn::bail!(ErrorKind::DoesNotExist { entity: self.table(), id }),
        }
    }

    /// Rename the row in place, which every linked book will see.
    async fn rename(self, conn: &mut SqliteConnection, id: i64, name: &str) -> Result<()> {
        let table = self.table();
        let sql = match self {
            Self::Author => "UPDATE author SET name = ? WHERE id = ?",
            Self::Tag => "UPDATE tag SET name = ? WHERE id = ?",
            Self::Series => "UPDATE series SET name = ? WHERE id = ?",
        };
        let result = sqlx::query(sql)
            .bind(name)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, table, "update", Some(OnUnique::Name { entity: table, name }), None))?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NoChange { entity: table, id });
        }
        Ok(())
    }

    /// Delete the row. Authors still linked to a book are [`ErrorKind::InUse`].
    async fn delete(self, conn: &mut SqliteConnection, id: i64) -> Result<()> {
        let table = self.table();
        let sql = match self {
            Self::Author => "DELETE FROM author WHERE id = ?",
            Self::Tag => "DELETE FROM tag WHERE id = ?",
            Self::Series => "DELETE FROM series WHERE id = ?",
        };
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, table, "delete", None, Some(id)))?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NoChange { entity: table, id });
        }
        Ok(())
    }
}
