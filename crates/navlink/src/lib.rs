//! Navigation-mesh pathfinding: incremental polygon graph, entry-point search, and funnel smoothing.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod funnel;
pub mod graph;
pub mod key;
pub mod math;
pub mod navigator;
pub mod query;
pub mod search;
pub mod source;

pub use config::NavConfig;
pub use error::{ConfigError, NavError, PathError, Result};
pub use graph::{Connection, Edge, EdgeRef, MeshId, Navigation, Polygon, PolygonRef};
pub use key::{EdgeKey, PointKey};
pub use math::{Face3, Plane, Transform, Vec3};
pub use navigator::{NavCorridor, NavPath, Navigator};
pub use search::{ChainStep, NavQuery, PolygonChain};
pub use source::NavMeshSource;
