//! SQLite storage engine for the dusk library catalog.
//!
//! The catalog is a set of books plus the rows that hang off them:
//! - **Shared** authors and tags, linked to any number of books and
//!   deduplicated by name.
//! - **Exclusive** ISBN-10s, ISBN-13s and format paths, each owned by exactly
//!   one book.
//! - An optional **series**, unique by name across the catalog.
//!
//! Open a [`Database`], wrap it in a [`Store`] and use the operations on it.
//! Every operation is a single transaction, and every operation that writes a
//! book leaves the catalog free of orphaned rows when it commits.
//!
//! Listings are paginated with a row-number cursor; see [`BookFilter`],
//! [`SearchFilter`] and [`Page`].

mod db;
mod entity;
pub mod error;
mod link;
mod models;
mod query;
mod store;
mod sweep;
mod tx;

#[cfg(test)]
mod testing;

pub use crate::db::Database;
pub use crate::query::{BookFilter, DEFAULT_LIMIT, Direction, MAX_AFTER, Page, SearchFilter, Sort};
pub use crate::store::Store;
