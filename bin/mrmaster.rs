use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mapred::mr::{EngineConfig, FailurePolicy, MapReduce};
use mapred::mrapps::get_app;
use mapred::mrrt::{input, logging, output};

/// Runs a map/reduce application over files with one worker per input.
#[derive(Parser)]
#[command(name = "mrmaster")]
struct Args {
    /// Application to run (`ii` or `wc`).
    app: String,
    /// Input files or directories.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// JSON engine configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Per-phase limit on waiting for workers, in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,
    #[arg(long, value_enum)]
    failure_policy: Option<FailurePolicy>,
    /// Runtime worker threads.
    #[arg(long)]
    threads: Option<usize>,
    /// Print the result as JSON instead of a table.
    #[arg(long)]
    json: bool,
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    logging::init(args.verbose);

    let mut config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(ms) = args.timeout_ms {
        config.phase_timeout_ms = ms;
    }
    if let Some(policy) = args.failure_policy {
        config.failure_policy = policy;
    }
    if args.threads.is_some() {
        config.worker_threads = args.threads;
    }

    let app = get_app(&args.app)?;
    let inputs = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(input::path_records(args.inputs.as_slice()))?;
    log::info!("app: {}, {} inputs", args.app, inputs.len());

    let result = MapReduce::new(config)
        .run_app(app, inputs)
        .with_context(|| format!("running {}", args.app))?;

    if args.json {
        println!("{}", output::json(&result)?);
    } else {
        println!("Results:");
        print!("{}", output::table(&result));
    }
    Ok(())
}
