//! Permission result records.
//!
//! A [`Permission`] is the outcome of asking for a single capability. Several
//! records can be folded into one with [`Permission::combine`]: names are
//! joined in order, `granted` is the conjunction and `should_show_rationale`
//! the disjunction of the inputs.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Separator used when joining the names of combined permissions.
const NAME_SEPARATOR: &str = ", ";

/// Outcome of a permission request for one capability (or a combined batch).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    name: String,
    granted: bool,
    should_show_rationale: bool,
}

impl Permission {
    /// Create a record with `should_show_rationale` set to `false`.
    pub fn new(name: impl Into<String>, granted: bool) -> Self {
        Self::with_rationale(name, granted, false)
    }

    /// Create a record with an explicit rationale flag.
    pub fn with_rationale(
        name: impl Into<String>,
        granted: bool,
        should_show_rationale: bool,
    ) -> Self {
        Self {
            name: name.into(),
            granted,
            should_show_rationale,
        }
    }

    /// Fold an ordered, non-empty list of records into one.
    pub fn combine(permissions: &[Self]) -> Result<Self> {
        if permissions.is_empty() {
            return Err(Error::EmptyCombination);
        }

        let name = permissions
            .iter()
            .map(|p| p.name.as_str())
            .collect::<Vec<_>>()
            .join(NAME_SEPARATOR);

        Ok(Self {
            name,
            granted: permissions.iter().all(|p| p.granted),
            should_show_rationale: permissions.iter().any(|p| p.should_show_rationale),
        })
    }

    /// Capability name, or the joined names of a combined record.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn granted(&self) -> bool {
        self.granted
    }

    pub const fn should_show_rationale(&self) -> bool {
        self.should_show_rationale
    }
}

impl TryFrom<Vec<Permission>> for Permission {
    type Error = Error;

    fn try_from(permissions: Vec<Permission>) -> Result<Self> {
        Self::combine(&permissions)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.granted { "granted" } else { "denied" };
        write!(f, "{} ({state}", self.name)?;
        if self.should_show_rationale {
            f.write_str(", show rationale")?;
        }
        f.write_str(")")
    }
}
