//! navlink CLI - query navigation meshes described by a YAML scene.
//!
//! - `navlink path` - smoothed (or milestone) path between two points
//! - `navlink closest` - closest surface point, normal and owner
//! - `navlink segment` - closest surface point to a segment
//! - `navlink stats` - mesh, polygon and connection counts

mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::{fmt, EnvFilter};

use navlink::{MeshId, Navigation, Vec3};

use crate::scene::{parse_point, Scene};

#[derive(Parser)]
#[command(name = "navlink")]
#[command(about = "Navigation mesh pathfinding", version)]
struct Cli {
    /// Scene file (YAML)
    #[arg(short, long, global = true, default_value = "scene.yaml")]
    scene: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a path between two points
    Path {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: Vec3,

        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: Vec3,

        /// Visit portal midpoints instead of pulling the path taut
        #[arg(long)]
        raw: bool,
    },

    /// Closest point on the surface to a point
    Closest {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        point: Vec3,
    },

    /// Closest point on the surface to a segment
    Segment {
        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        from: Vec3,

        #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
        to: Vec3,

        /// Prefer the point where the segment hits the surface
        #[arg(long)]
        collision: bool,
    },

    /// Show mesh and connection counts
    Stats,
}

#[derive(Serialize)]
struct PathOutput {
    points: Vec<Vec3>,
    length: f32,
}

#[derive(Serialize)]
struct ClosestOutput<'a> {
    point: Vec3,
    normal: Vec3,
    owner: &'a str,
}

#[derive(Serialize)]
struct MeshStats<'a> {
    id: MeshId,
    name: &'a str,
    linked: bool,
    polygons: usize,
}

#[derive(Serialize)]
struct StatsOutput<'a> {
    meshes: Vec<MeshStats<'a>>,
    polygons: usize,
    connections: usize,
    joined: usize,
    pending: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let scene = Scene::load(&cli.scene)?;
    let nav = scene.build()?;
    tracing::info!(
        scene = %cli.scene.display(),
        meshes = nav.mesh_count(),
        polygons = nav.polygon_count(),
        "Loaded scene"
    );

    match cli.command {
        Commands::Path { from, to, raw } => find_path(&nav, from, to, raw),
        Commands::Closest { point } => closest(&nav, point),
        Commands::Segment { from, to, collision } => segment(&nav, from, to, collision),
        Commands::Stats => show_stats(&nav),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{json}");
    Ok(())
}

fn find_path(nav: &Navigation<String>, from: Vec3, to: Vec3, raw: bool) -> Result<()> {
    let points = nav
        .simple_path(from, to, !raw)
        .with_context(|| format!("No path from {from:?} to {to:?}"))?;
    let length = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    print_json(&PathOutput { points, length })
}

fn closest(nav: &Navigation<String>, point: Vec3) -> Result<()> {
    let (Some(closest), Some(normal), Some(owner)) = (
        nav.closest_point(point),
        nav.closest_point_normal(point),
        nav.closest_point_owner(point),
    ) else {
        anyhow::bail!("Scene has no navigable surface");
    };
    print_json(&ClosestOutput {
        point: closest,
        normal,
        owner,
    })
}

fn segment(nav: &Navigation<String>, from: Vec3, to: Vec3, collision: bool) -> Result<()> {
    let point = nav
        .closest_point_to_segment(from, to, collision)
        .context("Scene has no navigable surface")?;
    print_json(&point)
}

fn show_stats(nav: &Navigation<String>) -> Result<()> {
    let meshes = nav
        .mesh_ids()
        .map(|id| MeshStats {
            id,
            name: nav.mesh_owner(id).map(String::as_str).unwrap_or_default(),
            linked: nav.is_linked(id),
            polygons: nav.mesh_polygon_count(id).unwrap_or(0),
        })
        .collect();

    let table = nav.connection_table();
    print_json(&StatsOutput {
        meshes,
        polygons: nav.polygon_count(),
        connections: table.len(),
        joined: table.values().filter(|c| c.b().is_some()).count(),
        pending: table.values().map(|c| c.pending().len()).sum(),
    })
}
