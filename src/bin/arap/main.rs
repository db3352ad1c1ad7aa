//! arap CLI - exercise the deformation engine on generated meshes.
//!
//! Usage: arap <COMMAND> [OPTIONS]
//!
//! Run `arap --help` for available commands. Set `RUST_LOG=debug` for solver
//! diagnostics.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand};
use nalgebra::{Point3, Vector3};

use arap_deform::algo::deform::{ArapSolver, DeformOptions, StepOutcome, VertexType};
use arap_deform::algo::Progress;
use arap_deform::mesh::{grid, TriangleMesh};

#[derive(Parser)]
#[command(name = "arap")]
#[command(author, version, about = "As-rigid-as-possible deformation CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display topology, weight and Laplacian statistics for a grid
    Info {
        #[command(flatten)]
        grid: GridArgs,
    },

    /// Pin the left column of a grid, drag the right column over several frames
    Grid {
        #[command(flatten)]
        grid: GridArgs,

        /// Drag offset along X
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        dx: f64,

        /// Drag offset along Y
        #[arg(long, default_value = "0.0", allow_hyphen_values = true)]
        dy: f64,

        /// Drag offset along Z
        #[arg(long, default_value = "2.0", allow_hyphen_values = true)]
        dz: f64,

        /// Number of frames the drag is spread over
        #[arg(short, long, default_value = "30")]
        frames: usize,

        /// Local/global iterations per frame
        #[arg(short, long, default_value = "10")]
        iterations: usize,

        /// Stop iterating a frame once no vertex moves farther than this
        #[arg(short, long, default_value = "1e-6")]
        tolerance: f64,

        /// Relative covariance regularization
        #[arg(long, default_value = "1e-6")]
        regularization: f64,
    },
}

#[derive(Args)]
struct GridArgs {
    /// Number of grid cells along X
    #[arg(long, default_value = "20")]
    nx: usize,

    /// Number of grid cells along Y
    #[arg(long, default_value = "5")]
    ny: usize,

    /// Grid spacing
    #[arg(short, long, default_value = "1.0")]
    spacing: f64,
}

impl GridArgs {
    fn build(&self) -> Result<TriangleMesh, Box<dyn std::error::Error>> {
        if self.nx == 0 || self.ny == 0 {
            return Err("grid needs at least one cell in each direction".into());
        }
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(format!("invalid grid spacing {}", self.spacing).into());
        }
        Ok(grid(self.nx, self.ny, self.spacing))
    }
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
        Commands::Info { grid } => {
            cmd_info(&grid)?;
        }

        Commands::Grid {
            grid,
            dx,
            dy,
            dz,
            frames,
            iterations,
            tolerance,
            regularization,
        } => {
            let options = DeformOptions::default()
                .with_max_iterations(iterations)
                .with_tolerance(tolerance)
                .with_regularization(regularization);
            cmd_drag(&grid, Vector3::new(dx, dy, dz), frames, options)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that displays a progress bar on the terminal.
fn create_progress() -> Progress {
    let max_percent = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, message| {
        if total == 0 {
            return;
        }

        let percent = if current >= total {
            100
        } else {
            ((current * 100) + (total / 2)) / total
        };

        // Only redraw when the bar advances
        let previous = max_percent.fetch_max(percent, Ordering::Relaxed);
        if percent <= previous && percent != 100 {
            return;
        }

        let bar_width = 30;
        let filled = (percent * bar_width) / 100;
        let bar = "=".repeat(filled);
        let space = " ".repeat(bar_width - filled);

        eprint!("\r[{}{}] {:3}% {}", bar, space, percent, message);
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn cmd_info(args: &GridArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mesh = args.build()?;
    let solver = ArapSolver::new(&mesh, DeformOptions::default())?;
    let topology = solver.topology();

    println!("Grid: {} x {} cells, spacing {}", args.nx, args.ny, args.spacing);
    println!("Vertices: {}", mesh.num_vertices());
    println!("Faces: {}", mesh.num_faces());
    println!("Edges: {}", topology.neighbors.num_edges());

    let boundary_edges = topology
        .neighbors
        .edges()
        .filter(|&(i, j)| topology.opposite.is_boundary_edge(i, j))
        .count();
    println!("Boundary edges: {}", boundary_edges);

    if let Some((min, max)) = mesh.bounding_box() {
        println!("Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
            min.x, min.y, min.z, max.x, max.y, max.z);
    }

    let weights = solver.weights();
    let w_min = weights.iter().map(|(_, _, w)| w).fold(f64::INFINITY, f64::min);
    let w_max = weights.iter().map(|(_, _, w)| w).fold(f64::NEG_INFINITY, f64::max);
    let zero_weights = weights.iter().filter(|&(_, _, w)| w == 0.0).count();
    println!("\nCotangent weights:");
    println!("  range: [{:.6}, {:.6}]", w_min, w_max);
    println!("  zero-weight edges: {}", zero_weights);

    let laplacian = solver.laplacian();
    let max_row_sum = (0..laplacian.num_rows())
        .map(|i| laplacian.row_sum(i).abs())
        .fold(0.0_f64, f64::max);
    println!("\nLaplacian:");
    println!("  non-zeros: {}", laplacian.nnz());
    println!("  max |row sum|: {:.3e}", max_row_sum);

    Ok(())
}

fn cmd_drag(
    args: &GridArgs,
    offset: Vector3<f64>,
    frames: usize,
    options: DeformOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    if frames == 0 {
        return Err("frames must be at least 1".into());
    }

    let mesh = args.build()?;
    let max_x = args.nx as f64 * args.spacing;
    let types: Vec<VertexType> = mesh
        .vertices()
        .iter()
        .map(|p| {
            if p.x == 0.0 {
                VertexType::Fixed
            } else if p.x == max_x {
                VertexType::Draggable
            } else {
                VertexType::Calculated
            }
        })
        .collect();

    println!("Grid: {} vertices, {} faces", mesh.num_vertices(), mesh.num_faces());
    println!(
        "Dragging right column by ({:.3}, {:.3}, {:.3}) over {} frames ({} iterations/frame)...",
        offset.x, offset.y, offset.z, frames, options.max_iterations
    );

    let setup_start = Instant::now();
    let mut solver = ArapSolver::new(&mesh, options)?;
    let setup = setup_start.elapsed();

    let mut positions = mesh.vertices().to_vec();
    let progress = create_progress();
    let quiet = Progress::none();

    let mut total_iterations = 0;
    let mut converged_frames = 0;
    let mut slowest = Duration::ZERO;
    let start = Instant::now();

    for frame in 1..=frames {
        let t = frame as f64 / frames as f64;
        for (v, kind) in types.iter().enumerate() {
            if *kind == VertexType::Draggable {
                positions[v] = mesh.vertices()[v] + offset * t;
            }
        }

        let frame_start = Instant::now();
        let report = solver.deform(&types, &mut positions, &quiet)?;
        slowest = slowest.max(frame_start.elapsed());

        if let Some(reason) = report.skipped {
            eprintln!();
            return Err(format!("frame {} skipped: {:?}", frame, reason).into());
        }
        total_iterations += report.iterations;
        if report.converged {
            converged_frames += 1;
        }
        progress.report(frame, frames, "Dragging");
    }
    let elapsed = start.elapsed();

    // One more step to show the factorization is reused
    let settle = solver.solve_step(&types, &mut positions)?;

    println!("Setup: {:.2?}", setup);
    println!("Solve: {:.2?} total, {:.2?} slowest frame", elapsed, slowest);
    println!("Iterations: {} ({} of {} frames converged)", total_iterations, converged_frames, frames);
    if let StepOutcome::Solved { max_displacement, rotation_fallbacks, refactored, .. } = settle {
        println!("Settling step: max displacement {:.3e}, {} rotation fallbacks, refactored: {}",
            max_displacement, rotation_fallbacks, refactored);
    }

    let (mean, max) = edge_stretch(&solver, &positions);
    println!("Edge stretch: mean {:.4}%, max {:.4}%", mean * 100.0, max * 100.0);

    Ok(())
}

/// Mean and max relative change of edge length between rest and current pose.
fn edge_stretch(solver: &ArapSolver, positions: &[Point3<f64>]) -> (f64, f64) {
    let rest = solver.rest_positions();
    let mut sum = 0.0;
    let mut max = 0.0_f64;
    let mut count = 0;

    for (i, j) in solver.topology().neighbors.edges() {
        let rest_len = (rest[j] - rest[i]).norm();
        if rest_len == 0.0 {
            continue;
        }
        let stretch = ((positions[j] - positions[i]).norm() - rest_len).abs() / rest_len;
        sum += stretch;
        max = max.max(stretch);
        count += 1;
    }

    if count == 0 {
        (0.0, 0.0)
    } else {
        (sum / count as f64, max)
    }
}
