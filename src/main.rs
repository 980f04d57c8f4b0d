use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use voxel_terrain::terrain::ConnectorKind;
use voxel_terrain::{MeshFidelity, NoiseAlgorithm, TerrainConfig, TerrainPreset};

/// Roughness used by `--diamond-square` when the config does not choose one
const DEFAULT_ROUGHNESS: f32 = 0.5;
const DEFAULT_FALLOFF: f32 = 0.5;

#[derive(Parser, Debug)]
#[command(name = "voxel_terrain")]
#[command(about = "Generate chunked marching-cubes terrain and report mesh statistics")]
struct Args {
    /// JSON configuration file (missing fields take defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start from a named preset: flat, rolling or mountainous
    #[arg(short, long)]
    preset: Option<TerrainPreset>,

    /// Noise seed
    #[arg(short, long)]
    seed: Option<u32>,

    /// Chunk columns along x
    #[arg(long)]
    chunks_x: Option<usize>,

    /// Chunk columns along z
    #[arg(long)]
    chunks_z: Option<usize>,

    /// Chunks stacked in each column
    #[arg(long)]
    vertical_chunks: Option<usize>,

    /// Density nodes per chunk axis
    #[arg(short, long)]
    nodes: Option<usize>,

    /// Use diamond-square height planes (nodes - 1 must be a power of two)
    #[arg(long)]
    diamond_square: bool,

    /// Place vertices on the interpolated surface crossing instead of edge midpoints
    #[arg(long)]
    interpolate: bool,

    /// Worker threads (default: one per core)
    #[arg(short, long)]
    threads: Option<usize>,

    /// Print the resolved configuration as JSON and exit
    #[arg(long)]
    print_config: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn resolve_config(args: &Args) -> voxel_terrain::Result<TerrainConfig> {
    let mut config = match (&args.config, args.preset) {
        (Some(path), _) => {
            info!(path = %path.display(), "loading configuration");
            TerrainConfig::from_json_file(path)?
        }
        (None, Some(preset)) => TerrainConfig::from_preset(preset),
        (None, None) => TerrainConfig::default(),
    };

    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(n) = args.chunks_x {
        config.chunks_x = n;
    }
    if let Some(n) = args.chunks_z {
        config.chunks_z = n;
    }
    if let Some(n) = args.vertical_chunks {
        config.vertical_chunks = n;
    }
    if let Some(n) = args.nodes {
        config.nodes_per_axis = n;
    }
    if args.diamond_square && !matches!(config.algorithm, NoiseAlgorithm::DiamondSquare { .. }) {
        config.algorithm = NoiseAlgorithm::DiamondSquare {
            roughness: DEFAULT_ROUGHNESS,
            falloff: DEFAULT_FALLOFF,
        };
    }
    if args.interpolate {
        config.fidelity = MeshFidelity::Interpolated;
    }
    if args.threads.is_some() {
        config.threads = args.threads;
    }

    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> voxel_terrain::Result<()> {
    let config = resolve_config(&args)?;

    if args.print_config {
        println!("{}", config.to_json_pretty()?);
        return Ok(());
    }

    if let (None, Some(preset)) = (&args.config, args.preset) {
        println!("Preset: {} ({})", preset, preset.description());
    }
    println!("Generating terrain with seed: {}", config.seed);
    println!(
        "Grid: {}x{} columns, {} chunks high, {} nodes per chunk axis",
        config.chunks_x, config.chunks_z, config.vertical_chunks, config.nodes_per_axis
    );

    let terrain = voxel_terrain::generate(config)?;
    let stats = terrain.stats();

    println!();
    println!("Chunks: {} ({} vertices)", stats.chunks, stats.chunk_vertices);
    println!(
        "Connectors: {} ({} vertices), {} skipped at the grid edge",
        stats.connectors, stats.connector_vertices, stats.skipped_connectors
    );
    for kind in ConnectorKind::ALL {
        println!("  {:?}: {}", kind, terrain.connector_count_of(kind));
    }
    println!(
        "Triangles: {} total, {} solid nodes carved",
        terrain.total_triangles(),
        stats.solid_nodes
    );

    println!();
    println!("Phase timings:");
    for (phase, elapsed) in &stats.timings {
        println!("  {:<20} {:>8.2} ms", phase.to_string(), elapsed.as_secs_f64() * 1000.0);
    }
    println!("  {:<20} {:>8.2} ms", "total", stats.total_time().as_secs_f64() * 1000.0);

    Ok(())
}
