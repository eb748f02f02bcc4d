//! Fixtures shared by the store tests.

use dusk_model::Book;

use crate::{Database, Store};

pub(crate) fn book1() -> Book {
    Book {
        tags: vec!["tag 1".to_string()],
        ..Book::new("Book 1", ["Author 1"])
    }
}

pub(crate) fn book2() -> Book {
    Book {
        isbn10: vec!["0441013597".to_string()],
        series: Some("series 1".to_string()),
        formats: vec!["format 1".to_string()],
        ..Book::new("Book 2", ["Author 2"])
    }
}

pub(crate) fn book3() -> Book {
    Book {
        tags: vec!["tag 2".to_string(), "tag 3".to_string()],
        isbn10: vec!["0141439513".to_string()],
        ..Book::new("Book 3", ["Author 3", "Author 4", "Author 5"])
    }
}

pub(crate) fn book4() -> Book {
    Book {
        isbn13: vec!["9781328869333".to_string()],
        ..Book::new("Book 4", ["Author 5"])
    }
}

/// An in-memory catalog holding books 1 to 4, created in order.
pub(crate) async fn seeded() -> (Database, Store) {
    seed(Database::connect_in_memory().await.unwrap()).await
}

/// Books 1 to 4 in `db`, which is expected to be empty.
pub(crate) async fn seed(db: Database) -> (Database, Store) {
    let store = Store::new(&db);
    for book in [book1(), book2(), book3(), book4()] {
        store.create_book(&book).await.unwrap();
    }
    (db, store)
}

pub(crate) async fn count(db: &Database, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

/// Rows that no longer belong to anything.
pub(crate) async fn orphans(db: &Database) -> i64 {
    sqlx::query_scalar(
        r#"
            SELECT
                (SELECT COUNT(*) FROM author WHERE id NOT IN (SELECT author FROM book_author_link))
              + (SELECT COUNT(*) FROM tag WHERE id NOT IN (SELECT tag FROM book_tag_link))
              + (SELECT COUNT(*) FROM isbn10 WHERE book_id NOT IN (SELECT id FROM book))
              + (SELECT COUNT(*) FROM isbn13 WHERE book_id NOT IN (SELECT id FROM book))
              + (SELECT COUNT(*) FROM format WHERE book_id NOT IN (SELECT id FROM book))
              + (SELECT COUNT(*) FROM series WHERE book_id NOT IN (SELECT id FROM book))
        "#,
    )
    .fetch_one(db.pool())
    .await
    .unwrap()
}
