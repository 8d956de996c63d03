//! hedgemesh CLI - inspect and check triangle mesh connectivity.
//!
//! Usage: hedgemesh <COMMAND> [OPTIONS] <INPUT> [OUTPUT]
//!
//! Run `hedgemesh --help` for available commands.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use clap::{Parser, Subcommand};
use nalgebra::Vector3;

use hedgemesh::io;
use hedgemesh::mesh::{build_from_buffers_with, BuildOptions, HalfEdgeMesh};
use hedgemesh::progress::Progress;
use hedgemesh::transform::ModelTransform;

#[derive(Parser)]
#[command(name = "hedgemesh")]
#[command(author, version, about = "Half-edge mesh connectivity CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display mesh information
    Info {
        /// Input mesh file
        input: PathBuf,
    },

    /// Build a mesh and verify every connectivity invariant
    Check {
        /// Input mesh file
        input: PathBuf,

        /// Hide the progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Apply a model transform to vertex positions
    Transform {
        /// Input mesh file
        input: PathBuf,

        /// Output mesh file
        output: PathBuf,

        /// Scale factors as x,y,z
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        scale: Option<[f64; 3]>,

        /// Rotation axis as x,y,z
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true, requires = "angle")]
        rotate_axis: Option<[f64; 3]>,

        /// Rotation angle in radians (counter-clockwise)
        #[arg(long, allow_hyphen_values = true, requires = "rotate_axis")]
        angle: Option<f64>,

        /// Translation as x,y,z
        #[arg(long, value_parser = parse_triple, allow_hyphen_values = true)]
        translate: Option<[f64; 3]>,
    },
}

fn parse_triple(s: &str) -> Result<[f64; 3], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected three comma-separated numbers, got '{}'", s));
    }
    let mut out = [0.0; 3];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("'{}' is not a number", part))?;
    }
    Ok(out)
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Check { input, quiet } => {
            cmd_check(&input, quiet)?;
        }

        Commands::Transform {
            input,
            output,
            scale,
            rotate_axis,
            angle,
            translate,
        } => {
            let rotation = rotate_axis.zip(angle);
            cmd_transform(&input, &output, scale, rotation, translate)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = AtomicUsize::new(0);

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let raw_percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Never move backwards when a pass hands over to the next one.
        let previous = max_percent.fetch_max(raw_percent, Ordering::Relaxed);
        if raw_percent <= previous && raw_percent != 100 {
            return;
        }
        let percent = raw_percent.max(previous);

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {:<28}", bar, space, percent, message);
        let _ = std::io::stderr().flush();
    })
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mesh: HalfEdgeMesh = io::load(input)?;

    println!("File: {}", input.display());
    println!("Vertices: {}", mesh.num_vertices());
    println!("Edges: {}", mesh.num_edges());
    println!("Faces: {}", mesh.num_faces());
    println!("Half-edges: {}", mesh.num_halfedges());
    println!("Euler characteristic: {}", mesh.euler_characteristic());

    let isolated = mesh.vertex_ids().filter(|&v| mesh.is_isolated_vertex(v)).count();
    if isolated > 0 {
        println!("Isolated vertices: {}", isolated);
    }

    let loops = mesh.boundary_loops();
    if loops.is_empty() {
        println!("Topology: Closed (no boundary)");
    } else {
        let lengths: Vec<String> = loops.iter().map(|l| l.len().to_string()).collect();
        println!(
            "Topology: Open ({} boundary loops, lengths {})",
            loops.len(),
            lengths.join(", ")
        );
    }

    println!("Surface area: {:.6}", mesh.surface_area());

    if let Some((min, max)) = mesh.bounding_box() {
        println!(
            "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z
        );
        let diag = max - min;
        println!("Dimensions: {:.3} x {:.3} x {:.3}", diag.x, diag.y, diag.z);
    }

    Ok(())
}

fn cmd_check(input: &Path, quiet: bool) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(input)?;
    let buffers = io::obj::parse(&text)?;

    let mut options = BuildOptions::default().with_validation(true);
    if !quiet {
        options = options.with_progress(create_progress());
    }

    let start = Instant::now();
    let result: hedgemesh::error::Result<HalfEdgeMesh> =
        build_from_buffers_with(&buffers.indices, &buffers.positions, &options);
    if !quiet {
        eprintln!();
    }
    let mesh = result?;

    println!(
        "OK: {} vertices, {} edges, {} faces, {} boundary loops ({:.2?})",
        mesh.num_vertices(),
        mesh.num_edges(),
        mesh.num_faces(),
        mesh.num_boundary_loops(),
        start.elapsed()
    );

    Ok(())
}

fn cmd_transform(
    input: &Path,
    output: &Path,
    scale: Option<[f64; 3]>,
    rotation: Option<([f64; 3], f64)>,
    translate: Option<[f64; 3]>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut mesh: HalfEdgeMesh = io::load(input)?;

    let mut context = ModelTransform::new();
    if let Some([sx, sy, sz]) = scale {
        context.scale(sx, sy, sz);
    }
    if let Some(([x, y, z], angle)) = rotation {
        context.rotate(&Vector3::new(x, y, z), angle)?;
    }
    if let Some([tx, ty, tz]) = translate {
        context.translate(tx, ty, tz);
    }

    let positions = context.transformed_positions(&mesh);
    let ids: Vec<_> = mesh.vertex_ids().collect();
    for (v, p) in ids.into_iter().zip(positions) {
        mesh.set_position(v, p);
    }

    io::save(&mesh, output)?;
    println!("Saved {} vertices to {}", mesh.num_vertices(), output.display());

    Ok(())
}
