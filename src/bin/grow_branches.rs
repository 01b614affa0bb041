//! Grow a small light-seeking tree and write its branch meshes as OBJ
//!
//! Usage:
//!     grow_branches [OPTIONS] <OUTPUT.obj>
//!
//! Options:
//!     -c, --config <FILE>     Grid configuration JSON (default: built-in grid)
//!     -g, --growth <FILE>     Growth parameters JSON (default: built-in)
//!     -n, --steps <N>         Segments per trunk (overrides growth file)
//!     -s, --sides <N>         Polygon sides of the trunk mesh (default: 8)
//!     -h, --help              Show this help message

use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

use phototropism::core::{logging, DVec3, Result};
use phototropism::growth::{grow_branch, Attachment, GrowthParams};
use phototropism::math::constants::TAU;
use phototropism::math::Vector;
use phototropism::mesh::{build_branch_meshes, ObjSink};
use phototropism::occlusion::{GridConfig, OcclusionGrid};
use phototropism::skeleton::{BranchInfo, SegmentGraph, SegmentId};

/// Golden angle, so successive laterals spread evenly around the trunk.
const LATERAL_TURN: f64 = 2.399_963_229_728_653;

fn print_help() {
    eprintln!("grow_branches - Light-seeking branch growth demo");
    eprintln!();
    eprintln!("Usage: grow_branches [OPTIONS] <OUTPUT.obj>");
    eprintln!();
    eprintln!("Options:");
    eprintln!("    -c, --config <FILE>     Grid configuration JSON (default: built-in grid)");
    eprintln!("    -g, --growth <FILE>     Growth parameters JSON (default: built-in)");
    eprintln!("    -n, --steps <N>         Segments per trunk (overrides growth file)");
    eprintln!("    -s, --sides <N>         Polygon sides of the trunk mesh (default: 8)");
    eprintln!("    -h, --help              Show this help message");
    eprintln!();
    eprintln!("Example:");
    eprintln!("    grow_branches -n 10 tree.obj");
    eprintln!("    grow_branches --config grid.json --sides 12 tree.obj");
}

#[derive(Debug)]
struct Args {
    output: PathBuf,
    config: Option<PathBuf>,
    growth: Option<PathBuf>,
    steps: Option<u32>,
    sides: u32,
}

fn parse_args() -> std::result::Result<Args, String> {
    let args: Vec<String> = env::args().skip(1).collect();

    if args.is_empty() {
        return Err("Missing output file".to_string());
    }

    let mut config: Option<PathBuf> = None;
    let mut growth: Option<PathBuf> = None;
    let mut steps: Option<u32> = None;
    let mut sides: u32 = 8;
    let mut output: Option<PathBuf> = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            "-c" | "--config" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --config".to_string());
                }
                config = Some(PathBuf::from(&args[i]));
            }
            "-g" | "--growth" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --growth".to_string());
                }
                growth = Some(PathBuf::from(&args[i]));
            }
            "-n" | "--steps" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --steps".to_string());
                }
                steps = Some(args[i].parse().map_err(|_| format!("Invalid steps: {}", args[i]))?);
            }
            "-s" | "--sides" => {
                i += 1;
                if i >= args.len() {
                    return Err("Missing value for --sides".to_string());
                }
                sides = args[i].parse().map_err(|_| format!("Invalid sides: {}", args[i]))?;
                if sides < 2 {
                    return Err(format!("Sides must be at least 2, got {}", sides));
                }
            }
            arg if arg.starts_with('-') => {
                return Err(format!("Unknown option: {}", arg));
            }
            path => {
                if output.is_some() {
                    return Err("Multiple output files specified".to_string());
                }
                output = Some(PathBuf::from(path));
            }
        }
        i += 1;
    }

    let output = output.ok_or("Missing output file")?;

    Ok(Args { output, config, growth, steps, sides })
}

/// Dense slab of block points over the +x side of the grid, three quarters up.
fn place_canopy(grid: &mut OcclusionGrid) -> Result<usize> {
    let config = grid.config().clone();
    let step = config.unit_size;
    let height = config.size[1] * 0.75;
    let reach_x = config.size[0] * 0.4;
    let reach_z = config.size[2] * 0.15;

    let mut placed = 0;
    let mut x = step * 0.5;
    while x < reach_x {
        let mut z = -reach_z;
        while z <= reach_z {
            grid.add_block_point(DVec3::new(x, height, z), 0.8)?;
            placed += 1;
            z += step;
        }
        x += step;
    }
    Ok(placed)
}

fn grow_tree(grid: &OcclusionGrid, growth: &GrowthParams, sides: u32) -> Result<(SegmentGraph, Vec<SegmentId>)> {
    let mut graph = SegmentGraph::new();
    let trunk_branch = graph.add_branch(BranchInfo::new(0.01, sides));

    let trunk = grow_branch(
        grid,
        &mut graph,
        trunk_branch,
        Attachment::Root(DVec3::new(0.0, 0.05, 0.0)),
        Vector::new(0.0, 1.0, 0.0),
        growth,
    )?;

    let lateral_params = GrowthParams {
        base_radius: growth.base_radius * 0.4,
        min_radius: growth.min_radius.min(growth.base_radius * 0.4),
        steps: (growth.steps / 2).max(1),
        ..growth.clone()
    };
    let lateral_sides = (sides / 2).max(3);

    let mut laterals = 0;
    let mut polar = 0.0_f64;
    for &parent in trunk.iter().skip(1).step_by(2) {
        let segment = graph.segment(parent)?;
        let at = segment.start() + segment.vector() * 0.5;
        let direction = Vector::new(polar.cos(), 0.6, polar.sin());
        polar = (polar + LATERAL_TURN) % TAU;

        let branch = graph.add_branch(BranchInfo::new(0.01, lateral_sides));
        let grown = grow_branch(
            grid,
            &mut graph,
            branch,
            Attachment::Lateral { parent, at },
            direction,
            &lateral_params,
        )?;
        if !grown.is_empty() {
            laterals += 1;
        }
    }

    log::info!("Grew trunk of {} segments with {} laterals", trunk.len(), laterals);
    Ok((graph, trunk))
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => GridConfig::load_sync(path)?,
        None => GridConfig::default(),
    };
    let mut growth = match &args.growth {
        Some(path) => GrowthParams::load_sync(path)?,
        None => GrowthParams::default(),
    };
    if let Some(steps) = args.steps {
        growth.steps = steps;
    }

    let start = Instant::now();
    let mut grid = OcclusionGrid::new(config)?;
    let placed = place_canopy(&mut grid)?;
    println!("Placed {} canopy block points", placed);

    let (graph, trunk) = grow_tree(&grid, &growth, args.sides)?;
    let Some(&root) = trunk.first() else {
        println!("Trunk start lies outside the grid; nothing to mesh");
        return Ok(());
    };

    let meshes = build_branch_meshes(&graph, root)?;
    let file = File::create(&args.output)?;
    let mut sink = ObjSink::new(BufWriter::new(file));
    for (i, mesh) in meshes.iter().enumerate() {
        mesh.submit(&mut sink, &format!("branch_{i}"))?;
    }
    sink.finish()?;

    println!(
        "Wrote {} branch meshes ({} segments) in {:.2}s",
        meshes.len(),
        graph.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

fn main() {
    logging::init();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            print_help();
            std::process::exit(1);
        }
    };

    println!("Branch Growth Demo");
    println!("==================");
    println!("Output: {}", args.output.display());
    println!("Trunk sides: {}", args.sides);
    println!();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
