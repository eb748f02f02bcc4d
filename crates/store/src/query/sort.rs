use derive_more::Display;

use crate::error::{ErrorKind, Result};

/// Which listing a sort token is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Listing {
    Books,
    Authors,
    Tags,
    Series,
}

impl Listing {
    /// The relation the listing pages over.
    pub(crate) fn source(self) -> &'static str {
        match self {
            Self::Books => "book_view",
            Self::Authors => "author",
            Self::Tags => "tag",
            Self::Series => "series",
        }
    }

    fn default_column(self) -> &'static str {
        match self {
            Self::Books => "title",
            Self::Authors | Self::Tags | Self::Series => "name",
        }
    }

    /// Map a user-facing sort key to a column of [`source`](Self::source).
    ///
    /// This is the only way a column name reaches generated SQL.
    fn column(self, key: &str) -> Option<&'static str> {
        match (self, key) {
            (Self::Books, "title") => Some("title"),
            (Self::Books, "rating") => Some("rating"),
            (Self::Books, "num_of_pages") => Some("num_of_pages"),
            (Self::Books, "progress") => Some("progress"),
            (Self::Books, "date_added") => Some("date_added"),
            (Self::Books, "date_updated") => Some("date_updated"),
            (Self::Books, "date_published") => Some("date_published"),
            (Self::Books, "date_completed") => Some("date_completed"),
            (Self::Authors | Self::Tags | Self::Series, "name") => Some("name"),
            _ => None,
        }
    }
}

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    #[display("ASC")]
    Asc,
    #[display("DESC")]
    Desc,
}

/// A validated sort order: a safelisted column and a direction.
///
/// Tokens look like `title` (ascending) or `-rating` (descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    column: &'static str,
    direction: Direction,
}

impl Sort {
    pub(crate) fn parse(listing: Listing, token: Option<&str>) -> Result<Self> {
        let token = token.map(str::trim).unwrap_or_default();
        if token.is_empty() {
            return Ok(Self {
                column: listing.default_column(),
                direction: Direction::Asc,
            });
        }
        let (key, direction) = match token.strip_prefix('-') {
            Some(key) => (key, Direction::Desc),
            None => (token, Direction::Asc),
        };
        match listing.column(key) {
            Some(column) => Ok(Self { column, direction }),
            None => exn::bail!(ErrorKind::InvalidSort(token.to_string())),
        }
    }

    pub fn column(&self) -> &'static str {
        self.column
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The token this sort was parsed from, in canonical form.
    pub fn token(&self) -> String {
        match self.direction {
            Direction::Asc => self.column.to_string(),
            Direction::Desc => format!("-{}", self.column),
        }
    }
}
