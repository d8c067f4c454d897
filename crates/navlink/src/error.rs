use thiserror::Error;

use crate::MeshId;

/// Errors from mutating a [`Navigation`](crate::Navigation).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavError {
    #[error("unknown navmesh id: {0}")]
    UnknownMesh(MeshId),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConfigError {
    #[error("cell size must be finite and > 0 (got {0})")]
    CellSize(f32),

    #[error("up vector must be finite and non-zero")]
    UpVector,

    #[error("path epsilon must be finite and >= 0 (got {0})")]
    PathEpsilon(f32),
}

/// Why a path query produced no path.
///
/// None of these are faults: empty or disconnected navmeshes are ordinary states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("no navigable surface")]
    NoNavigableSurface,

    #[error("start and end lie in disconnected regions")]
    Disconnected,

    #[error("search truncated after expanding {expanded} polygons")]
    SearchTruncated { expanded: usize },
}

pub type Result<T, E = NavError> = std::result::Result<T, E>;
