//! Navigation configuration.

use crate::{ConfigError, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default vertex quantization: one centimeter.
pub const DEFAULT_CELL_SIZE: f32 = 0.01;
/// Default minimum spacing between consecutive path points.
pub const DEFAULT_PATH_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavConfig {
    /// Quantization granularity used to match vertices of independently built meshes.
    ///
    /// Must be smaller than the smallest intentional gap between unrelated edges, otherwise those
    /// edges merge.
    pub cell_size: f32,
    /// Up vector used for polygon winding and funnel left/right decisions.
    pub up: Vec3,
    /// Points closer than this to the previously emitted path point are dropped.
    pub path_epsilon: f32,
    /// Upper bound on polygons expanded by a single search (`None` = unbounded).
    pub max_search_nodes: Option<usize>,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            up: Vec3::Y,
            path_epsilon: DEFAULT_PATH_EPSILON,
            max_search_nodes: None,
        }
    }
}

impl NavConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(ConfigError::CellSize(self.cell_size));
        }
        if !self.up.is_finite() || self.up.length_squared() <= f32::EPSILON {
            return Err(ConfigError::UpVector);
        }
        if !(self.path_epsilon.is_finite() && self.path_epsilon >= 0.0) {
            return Err(ConfigError::PathEpsilon(self.path_epsilon));
        }
        Ok(())
    }

    /// Portal intersections closer than this to the straight path count as lying on it.
    pub fn clip_tolerance(&self) -> f32 {
        self.path_epsilon.max(self.cell_size * 0.5)
    }
}
