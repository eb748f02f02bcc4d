//! Store Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction. Driver errors are kept as children
//! in the error tree; the [`ErrorKind`] on top is what callers match on.

use derive_more::{Display, Error};
use dusk_model::error::ErrorKind as ValidationErrorKind;
use exn::Exn;

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A single-entity lookup by id found nothing.
    #[display("{entity} {id} does not exist")]
    DoesNotExist { entity: &'static str, id: i64 },
    /// A lookup by name found nothing.
    #[display("{entity} {name:?} does not exist")]
    UnknownName { entity: &'static str, name: String },
    /// A listing query succeeded but matched zero rows.
    #[display("no items found")]
    NoRows,
    /// An author, tag or series with this name already exists.
    #[display("{entity} {name:?} already exists")]
    UniqueConstraint { entity: &'static str, name: String },
    /// The ISBN already belongs to another book.
    #[display("isbn {_0} already exists")]
    IsbnExists(#[error(not(source))] String),
    /// The file path already belongs to another book.
    #[display("format {_0} already exists")]
    FormatExists(#[error(not(source))] String),
    /// An update or delete affected no rows.
    #[display("no change executed on {entity} {id}")]
    NoChange { entity: &'static str, id: i64 },
    /// The row is still referenced and cannot be deleted.
    #[display("{entity} {id} is still referenced by a book")]
    InUse { entity: &'static str, id: i64 },
    /// A sort token outside the entity's safelist.
    #[display("invalid sort value: {_0:?}")]
    InvalidSort(#[error(not(source))] String),
    /// Pagination parameters out of bounds.
    #[display("invalid filter {field}: {reason}")]
    InvalidFilter { field: &'static str, reason: &'static str },
    /// The input failed domain validation.
    #[display("validation failed: {_0}")]
    Validation(#[error(not(source))] ValidationErrorKind),
    /// Another connection held the lock for longer than the busy timeout.
    #[display("database is busy during {operation} on {table}")]
    Busy { table: &'static str, operation: &'static str },
    /// Any other database failure, with the statement it came from.
    #[display("database error during {operation} on {table}")]
    Database { table: &'static str, operation: &'static str },
    /// The pool could not be opened.
    #[display("could not open database")]
    Connection,
    #[display("database migration error")]
    Migration,
    /// Stored data could not be converted into a domain value.
    #[display("invalid stored data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }

    /// Wrap a validation failure, keeping its frame as a child.
    #[track_caller]
    pub fn validation(err: dusk_model::error::Error) -> Error {
        let inner = (*err).clone();
        err.raise(ErrorKind::Validation(inner))
    }
}

/// Which uniqueness violation a failing insert should report.
#[derive(Debug, Clone, Copy)]
pub(crate) enum OnUnique<'a> {
    Name { entity: &'static str, name: &'a str },
    Isbn(&'a str),
    Format(&'a str),
}

/// Map a driver error raised by a statement against `table` into the store
/// taxonomy.
///
/// Constraint violations become their specific kinds; anything else is a
/// [`ErrorKind::Database`] carrying the table and operation.
#[track_caller]
pub(crate) fn classify(
    err: sqlx::Error,
    table: &'static str,
    operation: &'static str,
    on_unique: Option<OnUnique<'_>>,
    in_use: Option<i64>,
) -> Error {
    let kind = match err.as_database_error() {
        Some(db) if db.is_unique_violation() => match on_unique {
            Some(OnUnique::Name { entity, name }) => ErrorKind::UniqueConstraint {
                entity,
                name: name.to_string(),
            },
            Some(OnUnique::Isbn(value)) => ErrorKind::IsbnExists(value.to_string()),
            Some(OnUnique::Format(path)) => ErrorKind::FormatExists(path.to_string()),
            None => ErrorKind::Database { table, operation },
        },
        Some(db) if is_lock_contention(db.code().as_deref()) => ErrorKind::Busy { table, operation },
        Some(db) if db.is_foreign_key_violation() => match in_use {
            Some(id) => ErrorKind::InUse { entity: table, id },
            None => ErrorKind::Database { table, operation },
        },
        _ => ErrorKind::Database { table, operation },
    };
    Exn::new(err).raise(kind)
}

/// `SQLITE_BUSY` or `SQLITE_LOCKED`, including their extended codes.
fn is_lock_contention(code: Option<&str>) -> bool {
    code.and_then(|code| code.parse::<i32>().ok())
        .is_some_and(|code| matches!(code & 0xff, 5 | 6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::DoesNotExist { entity: "book", id: 7 }.to_string(),
            "book 7 does not exist"
        );
        assert_eq!(ErrorKind::NoRows.to_string(), "no items found");
        assert_eq!(ErrorKind::IsbnExists("0441013597".to_string()).to_string(), "isbn 0441013597 already exists");
        assert_eq!(
            ErrorKind::UniqueConstraint { entity: "author", name: "Author 1".to_string() }.to_string(),
            r#"author "Author 1" already exists"#
        );
        assert_eq!(ErrorKind::InvalidSort("title; DROP".to_string()).to_string(), r#"invalid sort value: "title; DROP""#);
    }

    #[test]
    fn classify_non_database_error() {
        let err = classify(sqlx::Error::RowNotFound, "author", "select", None, None);
        assert_eq!(*err, ErrorKind::Database { table: "author", operation: "select" });
    }

    #[rstest]
    #[case(Some("5"), true)]
    #[case(Some("517"), true)]
    #[case(Some("6"), true)]
    #[case(Some("2067"), false)]
    #[case(Some("SQLITE_BUSY"), false)]
    #[case(None, false)]
    fn test_lock_contention_codes(#[case] code: Option<&str>, #[case] expected: bool) {
        assert_eq!(is_lock_contention(code), expected);
    }

    #[test]
    fn only_busy_is_retryable() {
        assert!(ErrorKind::Busy { table: "book", operation: "update" }.is_retryable());
        assert!(!ErrorKind::Database { table: "book", operation: "update" }.is_retryable());
        assert!(!ErrorKind::NoRows.is_retryable());
    }
}
