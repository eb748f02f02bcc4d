use crate::error::{ErrorKind, Result, check_printable};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A person credited on one or more books.
///
/// Authors are shared: every book naming "Ursula K. Le Guin" links to the
/// same row. The store removes an author once no book links to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Author {
    pub id: i64,
    pub name: String,
}
impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: 0, name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            exn::bail!(ErrorKind::Missing { field: "name" });
        }
        check_printable("name", &self.name)
    }
}
impl From<String> for Author {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
impl Display for Author {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}
