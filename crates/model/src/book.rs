use crate::error::{ErrorKind, Result, check_printable};
use crate::isbn::{is_valid_isbn10, is_valid_isbn13, normalize};
use time::{Date, UtcDateTime};

/// Highest rating a book can be given.
pub const MAX_RATING: u8 = 10;

/// A book in the catalog.
///
/// Scalar fields live on the book row itself. The multi-valued fields are
/// stored in satellite tables and kept in sync by the store:
///
/// - `authors` and `tags` are shared with every other book naming them.
/// - `isbn10`, `isbn13` and `formats` are exclusive: a value may belong to at
///   most one book in the whole catalog.
/// - `series` is a single optional name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Book {
    /// Assigned by the store on insert; ignored on create.
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    /// At least one is required. Order is irrelevant.
    pub authors: Vec<String>,
    pub tags: Vec<String>,
    pub isbn10: Vec<String>,
    pub isbn13: Vec<String>,
    /// File paths of the book's formats (epub, pdf, ...).
    pub formats: Vec<String>,
    pub series: Option<String>,
    /// Zero means unknown.
    pub num_of_pages: u32,
    pub progress: u32,
    /// 0 (unrated) to [`MAX_RATING`].
    pub rating: u8,
    pub publisher: Option<String>,
    pub date_published: Option<Date>,
    pub description: Option<String>,
    pub notes: Option<String>,
    /// Path to the cover image.
    pub cover: Option<String>,
    pub date_started: Option<Date>,
    pub date_completed: Option<Date>,
    /// Set by the store.
    pub date_added: Option<UtcDateTime>,
    /// Set by the store on every update.
    pub date_updated: Option<UtcDateTime>,
}

impl Book {
    pub fn new<A: Into<String>>(title: impl Into<String>, authors: impl IntoIterator<Item = A>) -> Self {
        Self {
            title: title.into(),
            authors: authors.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Check the book before it is handed to storage.
    ///
    /// Storage relies on this having been called: it does not itself enforce
    /// the "at least one author" rule.
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            exn::bail!(ErrorKind::Missing { field: "title" });
        }
        if self.authors.iter().all(|a| a.trim().is_empty()) {
            exn::bail!(ErrorKind::Missing { field: "author" });
        }
        if self.rating > MAX_RATING {
            exn::bail!(ErrorKind::OutOfRange {
                field: "rating",
                reason: "must be <= 10"
            });
        }
        if self.num_of_pages > 0 && self.progress > self.num_of_pages {
            exn::bail!(ErrorKind::OutOfRange {
                field: "progress",
                reason: "must be <= num_of_pages"
            });
        }
        for author in &self.authors {
            check_printable("author", author)?;
        }
        for tag in &self.tags {
            check_printable("tag", tag)?;
        }
        for format in &self.formats {
            check_printable("format", format)?;
        }
        for value in &self.isbn10 {
            if !value.trim().is_empty() && !is_valid_isbn10(&normalize(value)) {
                exn::bail!(ErrorKind::InvalidIsbn {
                    field: "isbn10",
                    value: value.clone()
                });
            }
        }
        for value in &self.isbn13 {
            if !value.trim().is_empty() && !is_valid_isbn13(&normalize(value)) {
                exn::bail!(ErrorKind::InvalidIsbn {
                    field: "isbn13",
                    value: value.clone()
                });
            }
        }
        Ok(())
    }
}
