//! Domain types for the dusk library catalog.
//!
//! These types carry no storage knowledge. Validation lives here so that any
//! caller (HTTP handlers, importers) can reject bad input before a
//! transaction is opened.

mod author;
mod book;
pub mod error;
pub mod isbn;
mod series;
mod tag;

pub use crate::author::Author;
pub use crate::book::{Book, MAX_RATING};
pub use crate::isbn::Isbn;
pub use crate::series::Series;
pub use crate::tag::Tag;
