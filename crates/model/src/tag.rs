use crate::error::{ErrorKind, Result, check_printable};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// A free-form label shared between books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tag {
    pub id: i64,
    pub name: String,
}
impl Tag {
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
impl From<String> for Tag {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}
impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}
