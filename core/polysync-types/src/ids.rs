//! Identifier types: entity identity, source identity and run ids.
//!
//! An entity is addressed across every source by the pair
//! (`commonType`, `commonId`). Each source additionally keeps its own
//! source-local id, carried by [`crate::SourceLocalEntity`].

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// System-agnostic address of one logical entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityIdentity {
    /// The kind of entity (e.g. "contact", "invoice").
    pub common_type: String,
    /// The id of the entity, unique within its `common_type`.
    pub common_id: String,
}

impl EntityIdentity {
    /// Creates an identity from its two parts.
    pub fn new(common_type: impl Into<String>, common_id: impl Into<String>) -> Self {
        Self {
            common_type: common_type.into(),
            common_id: common_id.into(),
        }
    }

    pub fn common_type(&self) -> &str {
        &self.common_type
    }

    pub fn common_id(&self) -> &str {
        &self.common_id
    }
}

impl fmt::Display for EntityIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.common_type, self.common_id)
    }
}

impl FromStr for EntityIdentity {
    type Err = Error;

    /// Parses `commonType:commonId`. Only the first `:` separates the parts,
    /// so ids may themselves contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (common_type, common_id) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidIdentity(format!("missing ':' in {s:?}")))?;
        if common_type.is_empty() || common_id.is_empty() {
            return Err(Error::InvalidIdentity(format!("empty part in {s:?}")));
        }
        Ok(Self::new(common_type, common_id))
    }
}

/// Either a bare common id or a full identity.
///
/// Entry points accept this so callers that already know the common type
/// can pass only the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityRef {
    Id(String),
    Identity(EntityIdentity),
}

impl EntityRef {
    /// Resolves to a full identity, filling in `common_type` for bare ids.
    /// A full identity is returned unchanged.
    pub fn into_identity(self, common_type: &str) -> EntityIdentity {
        match self {
            Self::Id(id) => EntityIdentity::new(common_type, id),
            Self::Identity(identity) => identity,
        }
    }
}

impl From<&str> for EntityRef {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<String> for EntityRef {
    fn from(id: String) -> Self {
        Self::Id(id)
    }
}

impl From<EntityIdentity> for EntityRef {
    fn from(identity: EntityIdentity) -> Self {
        Self::Identity(identity)
    }
}

impl From<&EntityIdentity> for EntityRef {
    fn from(identity: &EntityIdentity) -> Self {
        Self::Identity(identity.clone())
    }
}

/// Identity of a source. `id` is the lookup key, `name` is display-only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceInfo {
    pub id: String,
    pub name: String,
}

impl SourceInfo {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SourceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Unique identifier for one reconciliation run.
/// Uses UUID v7 so run ids sort by start time in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(Uuid);

impl RunId {
    /// Creates a new run ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
