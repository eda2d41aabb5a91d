use anyhow::Context;
use clap::Parser;
use generator::sightings::DEFAULT_BEARING_NOISE;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::signal;
use trackcore::prelude::AnalysisConfig;
use trackcore::service::{ServiceHost, Tracker};
use trackcore::store::{FileStore, MemoryStore, SightingStore};
use workflow::config::WorkflowConfig;
use workflow::replay::start_replay;
use workflow::runner::Runner;

mod generator;
mod workflow;

#[derive(Parser)]
#[command(author, version, about = "Synthetic sighting workflow driver")]
struct Args {
    /// Simulate one scenario, run EM offline and write a JSON report
    #[arg(long, default_value_t = false)]
    offline: bool,
    /// Load a workflow config from YAML
    #[arg(long)]
    workflow: Option<PathBuf>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 3)]
    n_segments: usize,
    #[arg(long, default_value_t = 10)]
    iterations: usize,
    #[arg(long, default_value_t = 1)]
    restarts: usize,
    /// Observer detection radius in meters
    #[arg(long, default_value_t = 5_000.0)]
    radius: f64,
    #[arg(long, default_value_t = 10)]
    observers_per_segment: usize,
    /// Maximum absolute bearing error in radians
    #[arg(long, default_value_t = DEFAULT_BEARING_NOISE)]
    bearing_noise: f64,
    #[arg(long, default_value = "tools/data/offline_report.json")]
    report: PathBuf,
    /// Replay simulated sightings into the periodic tracker until Ctrl+C
    #[arg(long, default_value_t = false)]
    serve: bool,
    /// Simulated seconds replayed per wall-clock second
    #[arg(long, default_value_t = 60.0)]
    speedup: f64,
    /// Persist replayed sightings to a JSON-lines file instead of memory
    #[arg(long)]
    store: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let workflow_config = if let Some(path) = &args.workflow {
        WorkflowConfig::load(path)?
    } else {
        WorkflowConfig::from_args(
            args.seed,
            args.radius,
            args.observers_per_segment,
            args.bearing_noise,
            AnalysisConfig {
                n_segments: args.n_segments,
                iterations: args.iterations,
                restarts: args.restarts,
                ..Default::default()
            },
        )
    };
    let runner = Runner::new(workflow_config);

    if args.offline {
        let result = runner.execute()?;

        println!(
            "Offline run -> sightings {}, segments {}, cost {:.1} m",
            result.sightings.len(),
            result.estimates.len(),
            result.assignment_cost
        );
        for (idx, (target, count)) in result
            .estimates
            .iter()
            .zip(&result.assignment_counts)
            .enumerate()
        {
            println!(
                "  segment {}: {} sightings, t={:.0}..{:.0}s, speed {:.1} m/s",
                idx,
                count,
                target.start_time(),
                target.end_time(),
                target.speed()
            );
        }

        result
            .report(runner.config().seed)
            .write(&args.report)
            .context("writing offline report")?;
        println!("Report written to {}", args.report.display());
    }
    if args.serve {
        let runtime = TokioBuilder::new_multi_thread()
            .enable_all()
            .build()
            .context("creating tracker runtime")?;
        runtime.block_on(serve(&runner, args.store, args.speedup))?;
    }

    Ok(())
}

async fn serve(runner: &Runner, store_path: Option<PathBuf>, speedup: f64) -> anyhow::Result<()> {
    let mut rng = runner.rng();
    let simulator = runner.simulate(&mut rng)?;

    let store: Arc<dyn SightingStore> = match store_path {
        Some(path) => {
            let store = FileStore::open(&path)
                .with_context(|| format!("opening sighting store {}", path.display()))?;
            println!("Persisting sightings to {}", store.path().display());
            Arc::new(store)
        }
        None => Arc::new(MemoryStore::new()),
    };
    let analysis = runner.config().analysis.clone();
    let report_period = Some(analysis.analysis_interval)
        .filter(|secs| *secs > 0.0)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(Duration::from_secs(10));
    let tracker = Arc::new(Tracker::new(store, analysis));

    let mut host = ServiceHost::new();
    tracker.start(&mut host);
    start_replay(
        &mut host,
        Arc::clone(&tracker),
        simulator.sightings().to_vec(),
        speedup,
        report_period,
    );
    let center = simulator.field().center();
    println!(
        "Replaying {} sightings from {} observers (bearing noise {:.3} rad, field center {:.3}, {:.3}) at {}x (Ctrl+C to stop)...",
        simulator.sightings().len(),
        simulator.observers().len(),
        simulator.bearing_noise(),
        center.latitude,
        center.longitude,
        speedup
    );

    signal::ctrl_c().await.context("awaiting Ctrl+C to exit")?;
    host.shutdown().await.context("stopping services")?;

    let metrics = tracker.metrics();
    println!(
        "Stopped -> rounds {}, failed {}, targets {}, pruned {}",
        metrics.rounds_completed,
        metrics.rounds_failed,
        metrics.targets_published,
        metrics.sightings_pruned
    );
    Ok(())
}
