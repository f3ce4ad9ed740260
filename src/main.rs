use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc;

use netweave::config::{DEFAULT_CONFIG_FILE, NetweaveConfig};
use netweave::{
    AnimationDriver, Bounds, ClusterGenerator, DriverEvent, FrameSink, Graph, GraphJsonWriter,
    JsonLinesSink, LayoutSimulator, Writer, generate_mock_graph, load_graph_from_file,
};

/// Clustered network layouts for animated backdrops.
#[derive(Parser)]
#[command(name = "netweave")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Config file path
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a random connected graph document
    Mock {
        /// Node count (clamped to the configured range)
        #[arg(short, long)]
        nodes: Option<usize>,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output graph JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Clean up a graph document (unique ids, no dangling or duplicate links)
    Normalize {
        /// Input graph JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Output graph JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the layout headless with a fixed time step and write every frame
    Simulate {
        /// Graph JSON to lay out; a clustered graph is generated when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Canvas width in pixels
        #[arg(long)]
        width: Option<f64>,

        /// Canvas height in pixels
        #[arg(long)]
        height: Option<f64>,

        /// Number of ticks to run
        #[arg(long, default_value = "300")]
        ticks: u64,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output frames file (one JSON document per line)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Run the real-time driver until the frame limit or Ctrl-C
    Animate {
        /// Stop after this many frames
        #[arg(long)]
        frames: Option<u64>,

        /// Render one static frame instead of animating
        #[arg(long)]
        reduced_motion: bool,

        /// Seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Output frames file (one JSON document per line)
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn rng_for(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

fn frame_sink(output: &Path) -> anyhow::Result<JsonLinesSink<BufWriter<File>>> {
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    Ok(JsonLinesSink::new(BufWriter::new(file)))
}

fn mock(
    config: &NetweaveConfig,
    nodes: Option<usize>,
    seed: Option<u64>,
    output: &Path,
) -> anyhow::Result<()> {
    let rest = config.physics.spring_rest_length;
    let graph = generate_mock_graph(&mut rng_for(seed), &config.mock, nodes, rest);
    GraphJsonWriter::new()
        .write(&graph, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Wrote mock graph with {} nodes and {} links to {}",
        graph.len(),
        graph.edge_count(),
        output.display()
    );
    Ok(())
}

async fn normalize(config: &NetweaveConfig, input: &Path, output: &Path) -> anyhow::Result<()> {
    let graph = load_graph_from_file(input, config.physics.spring_rest_length)
        .await
        .with_context(|| format!("failed to load {}", input.display()))?;
    GraphJsonWriter::new()
        .write(&graph, output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Normalized {} nodes and {} links into {}",
        graph.len(),
        graph.edge_count(),
        output.display()
    );
    Ok(())
}

/// Load and place a graph document, or fall back to a generated layout
async fn initial_graph(
    config: &NetweaveConfig,
    input: Option<&Path>,
    rng: &mut StdRng,
    bounds: Bounds,
) -> Graph {
    let generator = ClusterGenerator::new(config.cluster.clone());
    if let Some(path) = input {
        match load_graph_from_file(path, config.physics.spring_rest_length).await {
            Ok(topology) => {
                return generator.seed_layout(rng, &topology, bounds.width, bounds.height);
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "falling back to a generated graph"
                );
            }
        }
    }
    generator.generate(rng, bounds.width, bounds.height)
}

async fn simulate(
    config: &NetweaveConfig,
    input: Option<&Path>,
    bounds: Bounds,
    ticks: u64,
    seed: Option<u64>,
    output: &Path,
) -> anyhow::Result<()> {
    let mut rng = rng_for(seed);
    let graph = initial_graph(config, input, &mut rng, bounds).await;
    let jitter = StdRng::seed_from_u64(rng.random());
    let mut simulator = LayoutSimulator::with_rng(graph, bounds, config.physics.clone(), jitter);
    let mut sink = frame_sink(output)?;

    let dt = config.physics.max_step;
    for _ in 0..ticks {
        if let Some(frame) = simulator.tick(dt) {
            sink.render(&frame)
                .with_context(|| format!("failed to write {}", output.display()))?;
        }
    }
    simulator.dispose();
    sink.release();

    println!(
        "Simulated {} ticks of {} nodes into {}",
        sink.frames_written(),
        simulator.graph().len(),
        output.display()
    );
    Ok(())
}

async fn animate(
    config: &NetweaveConfig,
    frames: Option<u64>,
    reduced_motion: bool,
    seed: Option<u64>,
    output: &Path,
) -> anyhow::Result<()> {
    let mut driver_config = config.driver.clone();
    if frames.is_some() {
        driver_config.max_frames = frames;
    }
    let mut driver = AnimationDriver::new(
        ClusterGenerator::new(config.cluster.clone()),
        config.physics.clone(),
        driver_config,
        frame_sink(output)?,
        rng_for(seed),
    );
    driver.start(config.canvas.width, config.canvas.height)?;

    let (tx, rx) = mpsc::channel(8);
    if reduced_motion {
        tx.send(DriverEvent::ReducedMotion).await?;
        tx.send(DriverEvent::Dispose).await?;
    }
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(DriverEvent::Dispose).await;
        }
    });

    driver
        .run(rx)
        .await
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Rendered {} frames into {}",
        driver.frames_rendered(),
        output.display()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("netweave=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = NetweaveConfig::load(&cli.config)?;

    match cli.command {
        Commands::Mock {
            nodes,
            seed,
            output,
        } => mock(&config, nodes, seed, &output)?,
        Commands::Normalize { input, output } => normalize(&config, &input, &output).await?,
        Commands::Simulate {
            input,
            width,
            height,
            ticks,
            seed,
            output,
        } => {
            let bounds = Bounds::new(
                width.unwrap_or(config.canvas.width).max(1.0),
                height.unwrap_or(config.canvas.height).max(1.0),
            );
            simulate(&config, input.as_deref(), bounds, ticks, seed, &output).await?
        }
        Commands::Animate {
            frames,
            reduced_motion,
            seed,
            output,
        } => animate(&config, frames, reduced_motion, seed, &output).await?,
    }

    Ok(())
}
