//! Orphan garbage collection.
//!
//! Runs at the end of every transaction that creates, updates or deletes a
//! book, so that no author or tag without links and no satellite row without
//! a book survives a commit.

use sqlx::SqliteConnection;

use crate::error::{Result, classify};

const SWEEPS: [(&str, &str); 6] = [
    ("author", "DELETE FROM author WHERE id NOT IN (SELECT author FROM book_author_link)"),
    ("tag", "DELETE FROM tag WHERE id NOT IN (SELECT tag FROM book_tag_link)"),
    ("isbn10", "DELETE FROM isbn10 WHERE book_id NOT IN (SELECT id FROM book)"),
    ("isbn13", "DELETE FROM isbn13 WHERE book_id NOT IN (SELECT id FROM book)"),
    ("format", "DELETE FROM format WHERE book_id NOT IN (SELECT id FROM book)"),
    ("series", "DELETE FROM series WHERE book_id NOT IN (SELECT id FROM book)"),
];

/// Delete every orphaned row, returning how many went in total.
pub(crate) async fn collect_orphans(conn: &mut SqliteConnection) -> Result<u64> {
    let mut total = 0;
    for (table, sql) in SWEEPS {
        let removed = sqlx::query(sql)
            .execute(&mut *conn)
            .await
            .map_err(|e| classify(e, table, "delete orphans", None, None))?
            .rows_affected();
        if removed > 0 {
            tracing::debug!(table, removed, "Deleted orphaned rows");
        }
        total += removed;
    }
    Ok(total)
}
