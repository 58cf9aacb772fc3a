//! Source roles and scopes.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Precedence role of a source within one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceRole {
    /// The authoritative source. Exactly one per run.
    Primary,
    /// Updated from the primary and may signal deletion back to it.
    Secondary,
    /// Only receives updates.
    Replica,
    /// Instantiated but never invoked.
    #[default]
    Unset,
}

impl SourceRole {
    /// Sort key for flow ordering: primary, then secondary, then the rest.
    /// Replica and unset share a rank.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
            Self::Replica | Self::Unset => 2,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Secondary => "secondary",
            Self::Replica => "replica",
            Self::Unset => "unset",
        }
    }
}

impl fmt::Display for SourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "secondary" => Ok(Self::Secondary),
            "replica" => Ok(Self::Replica),
            "unset" => Ok(Self::Unset),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

/// Whether a source needs per-entity context to operate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceScope {
    /// Operates without per-entity data.
    Global,
    /// Requires a context payload per entity (e.g. a per-user credential).
    Context,
}
