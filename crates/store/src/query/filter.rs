//! Caller-facing listing parameters.
//!
//! Both filters are plain data, shaped like the query string a handler
//! receives. They are checked when a listing runs, not when they are built.

use dusk_config::{MAX_PAGE_LIMIT, PaginationConfig};

use crate::error::{ErrorKind, Result};

/// Largest row-number cursor a caller may pass.
pub const MAX_AFTER: u32 = 10_000_000;
/// Page size when nothing else is configured.
pub const DEFAULT_LIMIT: u32 = 50;

fn check_bounds(after: u32, limit: u32) -> Result<()> {
    if after > MAX_AFTER {
        exn::bail!(ErrorKind::InvalidFilter {
            field: "after",
            reason: "must be <= 10 million"
        });
    }
    if limit == 0 {
        exn::bail!(ErrorKind::InvalidFilter {
            field: "limit",
            reason: "must be > 0"
        });
    }
    if limit > MAX_PAGE_LIMIT {
        exn::bail!(ErrorKind::InvalidFilter {
            field: "limit",
            reason: "must be <= 1000"
        });
    }
    Ok(())
}

/// Treat blank strings like absent ones.
fn term(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Listing parameters for books.
///
/// At most one of the text filters is applied. When several are set the first
/// of `search`, `title`, `author`, `tag`, `series` wins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFilter {
    /// Matches title, subtitle, author names and tag names.
    pub search: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub tag: Option<String>,
    pub series: Option<String>,
    /// Row-number cursor: only rows after this one are returned.
    pub after: u32,
    pub limit: u32,
    /// Sort token, `-` prefix for descending. Defaults to `title`.
    pub sort: Option<String>,
}

impl Default for BookFilter {
    fn default() -> Self {
        Self {
            search: None,
            title: None,
            author: None,
            tag: None,
            series: None,
            after: 0,
            limit: DEFAULT_LIMIT,
            sort: None,
        }
    }
}

impl BookFilter {
    pub fn with_config(config: &PaginationConfig) -> Self {
        Self {
            limit: config.default_limit,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds(self.after, self.limit)
    }

    pub(crate) fn predicate(&self) -> Predicate<'_> {
        if let Some(q) = term(&self.search) {
            Predicate::Search(q)
        } else if let Some(q) = term(&self.title) {
            Predicate::Title(q)
        } else if let Some(q) = term(&self.author) {
            Predicate::Author(q)
        } else if let Some(q) = term(&self.tag) {
            Predicate::Tag(q)
        } else if let Some(q) = term(&self.series) {
            Predicate::Series(q)
        } else {
            Predicate::All
        }
    }
}

/// Listing parameters for authors, tags and series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    /// Full-text match against the name.
    pub search: Option<String>,
    pub after: u32,
    pub limit: u32,
    /// Only `name` / `-name` are accepted.
    pub sort: Option<String>,
}

impl Default for SearchFilter {
    fn default() -> Self {
        Self {
            search: None,
            after: 0,
            limit: DEFAULT_LIMIT,
            sort: None,
        }
    }
}

impl SearchFilter {
    pub fn with_config(config: &PaginationConfig) -> Self {
        Self {
            limit: config.default_limit,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        check_bounds(self.after, self.limit)
    }

    pub(crate) fn predicate(&self) -> Predicate<'_> {
        match term(&self.search) {
            Some(q) => Predicate::Search(q),
            None => Predicate::All,
        }
    }
}

/// The single text condition a listing applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Predicate<'a> {
    All,
    Search(&'a str),
    Title(&'a str),
    Author(&'a str),
    Tag(&'a str),
    Series(&'a str),
}

/// Restricts a book listing to the books of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scope {
    All,
    Author(i64),
    Tag(i64),
    Series(i64),
}

/// Quote a term as an FTS5 phrase so its operators are matched literally.
pub(crate) fn fts_phrase(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}
