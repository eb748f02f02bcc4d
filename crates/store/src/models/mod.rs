mod book;
mod entity;

pub(crate) use self::book::{BookRow, date_to_timestamp};
pub(crate) use self::entity::EntityRow;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};

/// A listing row: the window-function metadata plus the row itself.
pub(crate) struct PagedRow<T> {
    /// Rows matching the filter, repeated on every row.
    pub(crate) count: i64,
    /// 1-based position in the sorted result.
    pub(crate) rowno: i64,
    pub(crate) row: T,
}
impl<'r, T: FromRow<'r, SqliteRow>> FromRow<'r, SqliteRow> for PagedRow<T> {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            count: row.try_get("count")?,
            rowno: row.try_get("rowno")?,
            row: T::from_row(row)?,
        })
    }
}

/// Separator `book_view` joins aggregated values with (`char(31)`).
const AGGREGATE_SEPARATOR: char = '\u{1f}';

/// Split an aggregate column back into its values.
///
/// A `NULL` aggregate (no sibling rows at all) is an empty list.
pub(crate) fn split_aggregate(aggregate: Option<String>) -> Vec<String> {
    match aggregate {
        Some(joined) if !joined.is_empty() => joined.split(AGGREGATE_SEPARATOR).map(str::to_string).collect(),
        _ => Vec::new(),
    }
}
