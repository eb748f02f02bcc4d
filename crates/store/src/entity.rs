//! Insert patterns for the rows hanging off a book.
//!
//! [`Shared`] rows (authors, tags, series) are deduplicated by name: inserting
//! a name that already exists hands back the existing id. [`Exclusive`] rows
//! (ISBNs, format paths) belong to exactly one book, so a collision is an
//! error instead.

use dusk_model::isbn;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::error::{ErrorKind, OnUnique, Result, classify};

// ============================================================================
// Shared (dedup-by-name)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shared {
    Author,
    Tag,
    /// Series rows are also owned by the book that first named them.
    Series { book: i64 },
}

impl Shared {
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Tag => "tag",
            Self::Series { .. } => "series",
        }
    }

    /// Insert `name` unless it already exists, returning the row id either way.
    pub(crate) async fn insert_or_get(self, conn: &mut SqliteConnection, name: &str) -> Result<i64> {
        let table = self.table();
        let query = match self {
            Self::Author => sqlx::query("INSERT OR IGNORE INTO author (name) VALUES (?)").bind(name),
            Self::Tag => sqlx::query("INSERT OR IGNORE INTO tag (name) VALUES (?)").bind(name),
            Self::Series { book } => sqlx::query("INSERT OR IGNORE INTO series (book_id, name) VALUES (?, ?)")
                .bind(book)
                .bind(name),
        };
        let result = query
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, table, "insert", None, None))?;
        if result.rows_affected() == 1 {
            return Ok(result.last_insert_rowid());
        }
        // Already there; names are unique so this is exactly one row.
        self.id_by_name(conn, name).await
    }

    /// [`insert_or_get`](Self::insert_or_get) for every name, in order.
    ///
    /// Duplicate names in the input resolve to the same id.
    pub(crate) async fn insert_many(self, conn: &mut SqliteConnection, names: &[String]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            ids.push(self.insert_or_get(conn, name).await?);
        }
        Ok(ids)
    }

    /// Plain insert used by explicit creation: an existing name is an error.
    pub(crate) async fn insert_unique(self, conn: &mut SqliteConnection, name: &str) -> Result<i64> {
        let table = self.table();
        let query = match self {
            Self::Author => sqlx::query("INSERT INTO author (name) VALUES (?)").bind(name),
            Self::Tag => sqlx::query("INSERT INTO tag (name) VALUES (?)").bind(name),
            Self::Series { book } => sqlx::query("INSERT INTO series (book_id, name) VALUES (?, ?)")
                .bind(book)
                .bind(name),
        };
        let result = query
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, table, "insert", Some(OnUnique::Name { entity: table, name }), None))?;
        Ok(result.last_insert_rowid())
    }

    async fn id_by_name(self, conn: &mut SqliteConnection, name: &str) -> Result<i64> {
        let table = self.table();
        let sql = match self {
            Self::Author => "SELECT id FROM author WHERE name = ?",
            Self::Tag => "SELECT id FROM tag WHERE name = ?",
            Self::Series { .. } => "SELECT id FROM series WHERE name = ?",
        };
        sqlx::query_scalar(sql)
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| classify(e, table, "select", None, None))
    }
}

// ============================================================================
// Exclusive (globally unique per book)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exclusive {
    Isbn10,
    Isbn13,
    Format,
}

impl Exclusive {
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Isbn10 => "isbn10",
            Self::Isbn13 => "isbn13",
            Self::Format => "format",
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::Isbn10 | Self::Isbn13 => "isbn",
            Self::Format => "filepath",
        }
    }

    fn on_unique(self, value: &str) -> OnUnique<'_> {
        match self {
            Self::Isbn10 | Self::Isbn13 => OnUnique::Isbn(value),
            Self::Format => OnUnique::Format(value),
        }
    }

    /// Canonical stored form; `None` for blank input.
    fn normalize(self, value: &str) -> Option<String> {
        let value = match self {
            Self::Isbn10 | Self::Isbn13 => isbn::normalize(value),
            Self::Format => value.trim().to_string(),
        };
        (!value.is_empty()).then_some(value)
    }

    /// Claim `value` for `book`.
    ///
    /// Fails with [`ErrorKind::IsbnExists`] or [`ErrorKind::FormatExists`] if
    /// any book (including this one) already holds it.
    pub(crate) async fn insert(self, conn: &mut SqliteConnection, book: i64, value: &str) -> Result<i64> {
        let table = self.table();
        let sql = match self {
            Self::Isbn10 => "INSERT INTO isbn10 (book_id, isbn) VALUES (?, ?)",
            Self::Isbn13 => "INSERT INTO isbn13 (book_id, isbn) VALUES (?, ?)",
            Self::Format => "INSERT INTO format (book_id, filepath) VALUES (?, ?)",
        };
        let result = sqlx::query(sql)
            .bind(book)
            .bind(value)
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, table, "insert", Some(self.on_unique(value)), None))?;
        if result.rows_affected() == 0 {
            exn::bail!(ErrorKind::NoChange { entity: table, id: book });
        }
        Ok(result.last_insert_rowid())
    }

    pub(crate) async fn insert_many(self, conn: &mut SqliteConnection, book: i64, values: &[String]) -> Result<Vec<i64>> {
        let mut ids = Vec::with_capacity(values.len());
        for value in values {
            ids.push(self.insert(conn, book, value).await?);
        }
        Ok(ids)
    }

    /// Values currently held by `book`, in insertion order.
    pub(crate) async fn get_for_book(self, conn: &mut SqliteConnection, book: i64) -> Result<Vec<String>> {
        let sql = match self {
            Self::Isbn10 => "SELECT isbn FROM isbn10 WHERE book_id = ? ORDER BY id",
            Self::Isbn13 => "SELECT isbn FROM isbn13 WHERE book_id = ? ORDER BY id",
            Self::Format => "SELECT filepath FROM format WHERE book_id = ? ORDER BY id",
        };
        sqlx::query_scalar(sql)
            .bind(book)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| classify(e, self.table(), "select", None, None))
    }

    /// Make the values held by `book` equal to `desired`.
    ///
    /// Values the book already holds are left alone, values it no longer wants
    /// are released, and only the remainder is inserted. Returns `false` when
    /// nothing had to change.
    pub(crate) async fn sync(self, conn: &mut SqliteConnection, book: i64, desired: &[String]) -> Result<bool> {
        let mut wanted: Vec<String> = Vec::with_capacity(desired.len());
        for value in desired.iter().filter_map(|v| self.normalize(v)) {
            if !wanted.contains(&value) {
                wanted.push(value);
            }
        }
        let current = self.get_for_book(conn, book).await?;

        let mut sorted_current = current.clone();
        sorted_current.sort_unstable();
        let mut sorted_wanted = wanted.clone();
        sorted_wanted.sort_unstable();
        if sorted_current == sorted_wanted {
            return Ok(false);
        }

        self.release_except(conn, book, &wanted).await?;
        let new: Vec<String> = wanted.into_iter().filter(|v| !current.contains(v)).collect();
        self.insert_many(conn, book, &new).await?;
        tracing::debug!(table = self.table(), book, inserted = new.len(), "Synchronized exclusive values");
        Ok(true)
    }

    /// Delete every value of `book` that is not in `keep`.
    async fn release_except(self, conn: &mut SqliteConnection, book: i64, keep: &[String]) -> Result<u64> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!("DELETE FROM {} WHERE book_id = ", self.table()));
        query.push_bind(book);
        if !keep.is_empty() {
            query.push(format!(" AND {} NOT IN (", self.column()));
            let mut values = query.separated(", ");
            for value in keep {
                values.push_bind(value.clone());
            }
            values.push_unseparated(")");
        }
        let result = query
            .build()
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, self.table(), "delete", None, None))?;
        Ok(result.rows_affected())
    }
}
