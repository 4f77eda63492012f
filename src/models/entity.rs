//! Entity types for the knowledge graph.
//!
//! Entities are the nodes of the graph: people, places, topics, commitments.
//! They are immutable once created except for alias additions, and are never
//! deleted: deactivation is a flag, preserving every assertion that ever
//! referenced them.

use crate::models::normalize::canonical_key;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a graph entity.
///
/// Entity ids are derived from the normalized surface form of the entity's
/// canonical name, so the same name always maps to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Creates an entity ID from an already-canonical string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives an entity ID from a raw surface form.
    #[must_use]
    pub fn from_surface(surface: &str) -> Self {
        Self(canonical_key(surface))
    }

    /// Returns the entity ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for EntityId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Kind of entity in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Named individual.
    Person,
    /// Geographic location.
    Place,
    /// Company, team, institution.
    Organization,
    /// Abstract subject of conversation.
    Topic,
    /// Promise or obligation with a lifecycle (see `Commitment`).
    Commitment,
    /// Scheduled occurrence, possibly with a due timestamp.
    Event,
    /// Anything that does not fit the other kinds.
    Other,
}

impl EntityKind {
    /// Returns the entity kind as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Person => "person",
            Self::Place => "place",
            Self::Organization => "organization",
            Self::Topic => "topic",
            Self::Commitment => "commitment",
            Self::Event => "event",
            Self::Other => "other",
        }
    }

    /// Parses an entity kind from a string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "person" | "people" | "user" => Some(Self::Person),
            "place" | "location" | "city" | "country" => Some(Self::Place),
            "organization" | "org" | "company" | "team" => Some(Self::Organization),
            "topic" | "concept" | "subject" => Some(Self::Topic),
            "commitment" | "promise" | "task" | "obligation" => Some(Self::Commitment),
            "event" | "meeting" | "appointment" => Some(Self::Event),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Returns true for kinds tracked by the commitment subsystem.
    #[must_use]
    pub const fn has_lifecycle(&self) -> bool {
        matches!(self, Self::Commitment | Self::Event)
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown entity kind: {s}"))
    }
}

/// An entity in the knowledge graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Canonical identifier.
    pub id: EntityId,
    /// Kind of entity.
    pub kind: EntityKind,
    /// Canonical display name (the surface form first seen).
    pub name: String,
    /// Alternative surface forms that resolve to this entity.
    pub aliases: Vec<String>,
    /// Creation timestamp (Unix seconds).
    pub created_at: i64,
    /// Entities are never deleted, only marked inactive.
    pub active: bool,
}

impl Entity {
    /// Creates a new active entity. The id is derived from the name.
    #[must_use]
    pub fn new(kind: EntityKind, name: impl Into<String>, created_at: i64) -> Self {
        let name = name.into();
        Self {
            id: EntityId::from_surface(&name),
            kind,
            name,
            aliases: Vec::new(),
            created_at,
            active: true,
        }
    }

    /// Creates an entity with an explicit id (for the canonical user entity,
    /// whose id comes from configuration rather than a surface form).
    #[must_use]
    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    /// Adds an alias if it is not already present (case-insensitive).
    ///
    /// Returns true if the alias was added. This is the only mutation an
    /// entity permits after creation besides deactivation.
    pub fn add_alias(&mut self, alias: impl Into<String>) -> bool {
        let alias = alias.into();
        let lower = alias.to_lowercase();
        if self.name.to_lowercase() == lower
            || self.aliases.iter().any(|a| a.to_lowercase() == lower)
        {
            return false;
        }
        self.aliases.push(alias);
        true
    }

    /// Returns true if this entity matches a name (canonical or alias),
    /// case-insensitively.
    #[must_use]
    pub fn matches_name(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        self.name.to_lowercase() == lower || self.aliases.iter().any(|a| a.to_lowercase() == lower)
    }
}
