//! Error types shared across the world core.
//!
//! Three classes are kept apart on purpose: fatal configuration errors
//! ([`RegionConfigError`]) abort world initialization, contract violations
//! ([`WorldError`]) reject a single operation without corrupting state, and
//! ordinary negative outcomes (a blocked step, an overlapping dynamic
//! region) are plain results on the operations themselves, never errors.

use crate::EntityId;
use thiserror::Error;

/// Contract violations and query failures on a live world.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("position ({x},{y}) is outside the bounds of plane {plane}")]
    PositionOutOfBounds { x: u32, y: u32, plane: u8 },

    #[error("entity {0} is not tracked by this map")]
    UnknownEntity(EntityId),

    #[error("entity {0} is already tracked by this map")]
    DuplicateEntity(EntityId),

    #[error("line-of-sight span of {span} steps exceeds the maximum of {max}")]
    LosSpanExceeded { span: u32, max: u32 },

    #[error("no plane {0} exists in this world")]
    UnknownPlane(u8),
}

/// Fatal world-definition errors detected while building or editing the
/// static region set. None of these are recoverable at runtime.
#[derive(Debug, Error)]
pub enum RegionConfigError {
    #[error("no world region is defined (exactly one region must have no parent)")]
    MissingWorldRegion,

    #[error("more than one region has no parent: '{first}' and '{second}'")]
    MultipleWorldRegions { first: String, second: String },

    #[error("region '{region}' names unknown parent '{parent}'")]
    UnknownParent { region: String, parent: String },

    #[error("region hierarchy cannot be resolved; {unresolved} regions have no path to the world region")]
    HierarchyStall { unresolved: usize },

    #[error("region '{region}' is on plane {plane} but its parent '{parent}' is on plane {parent_plane}")]
    PlaneMismatch {
        region: String,
        plane: u8,
        parent: String,
        parent_plane: u8,
    },

    #[error("a region with defname '{0}' is already registered")]
    DuplicateDefname(String),

    #[error("the world region cannot be deleted")]
    WorldRegionDelete,

    #[error("region handle is stale or refers to a dynamic region")]
    InvalidRegion,
}

/// Terrain source failures. The terrain store downgrades these to the empty
/// sector sentinel after logging; they only abort startup when the source is
/// unavailable outright.
#[derive(Debug, Error)]
pub enum TerrainError {
    #[error("terrain I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed terrain data for sector ({sx},{sy}) on plane {plane}: {detail}")]
    Format {
        sx: u16,
        sy: u16,
        plane: u8,
        detail: String,
    },

    #[error("no terrain data available for plane {0}")]
    MissingPlane(u8),
}
