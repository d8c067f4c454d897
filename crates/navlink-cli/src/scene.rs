//! YAML scene files: navigation config plus the meshes to register.

use std::path::Path;

use anyhow::{Context, Result};
use navlink::{NavConfig, NavMeshSource, Navigation, Transform, Vec3};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub config: NavConfig,
    #[serde(default)]
    pub meshes: Vec<SceneMesh>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneMesh {
    /// Owner label reported by `closest` queries.
    pub name: String,
    pub vertices: Vec<[f32; 3]>,
    pub polygons: Vec<Vec<u32>>,
    #[serde(default)]
    pub transform: SceneTransform,
}

/// Placement as translation, rotation about the scene's up vector, and per-axis scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneTransform {
    pub translation: [f32; 3],
    pub rotation_degrees: f32,
    pub scale: [f32; 3],
}

impl Default for SceneTransform {
    fn default() -> Self {
        Self {
            translation: [0.0; 3],
            rotation_degrees: 0.0,
            scale: [1.0; 3],
        }
    }
}

impl SceneTransform {
    pub fn to_transform(self, up: Vec3) -> Transform {
        Transform::from_parts(
            self.translation.into(),
            up,
            self.rotation_degrees.to_radians(),
            self.scale.into(),
        )
    }
}

impl Scene {
    /// Load a scene from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene from {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse scene from {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Register every mesh, owned by its name.
    pub fn build(&self) -> Result<Navigation<String>> {
        let mut nav = Navigation::with_config(self.config).context("Invalid navigation config")?;
        for mesh in &self.meshes {
            let source = NavMeshSource::new(
                mesh.vertices.iter().copied().map(Vec3::from).collect(),
                mesh.polygons.clone(),
            );
            let transform = mesh.transform.to_transform(self.config.up);
            let id = nav.add_mesh(source, transform, mesh.name.clone());
            tracing::debug!(mesh = %mesh.name, id = %id, "Registered mesh");
        }
        Ok(nav)
    }
}

/// Parse `x,y,z` into a point.
pub fn parse_point(s: &str) -> Result<Vec3, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let &[x, y, z] = parts.as_slice() else {
        return Err(format!("expected x,y,z but got {s:?}"));
    };
    let coord = |v: &str| {
        v.parse::<f32>()
            .map_err(|e| format!("invalid coordinate {v:?}: {e}"))
    };
    Ok(Vec3::new(coord(x)?, coord(y)?, coord(z)?))
}
