use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A named series a book belongs to.
///
/// Series names are unique across the catalog, and each stored series row is
/// owned by the book that first named it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    pub id: i64,
    pub name: String,
}
impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self { id: 0, name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            exn::bail!(ErrorKind::Missing { field: "name" });
        }
        Ok(())
    }
}
impl Display for Series {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}
