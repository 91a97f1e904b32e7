use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use cu_profile::{
    ProfilerAggregator, ProfilerConfig, profile_checkblock, profile_results, stop_checkblock,
};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_WORK_MS: u64 = 50;

struct Worker {
    work: Duration,
}

impl Worker {
    fn some_work(&self) {
        profile_checkblock!();
        thread::sleep(self.work);
    }
}

fn timed_step(work: Duration) {
    profile_checkblock!();
    thread::sleep(work);
}

fn parse_work_ms() -> anyhow::Result<u64> {
    let mut args = std::env::args().skip(1);
    let mut work_ms = DEFAULT_WORK_MS;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--work-ms" => {
                let value = args.next().context("--work-ms requires a value")?;
                work_ms = value
                    .parse()
                    .with_context(|| format!("invalid --work-ms value '{value}'"))?;
            }
            other => bail!("unknown argument '{other}' (usage: benchmark_demo [--work-ms <n>])"),
        }
    }

    Ok(work_ms)
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let work_ms = parse_work_ms()?;
    let work = Duration::from_millis(work_ms);
    let config = ProfilerConfig::from_env().context("Failed to load profiler config")?;
    ProfilerAggregator::setup_with(config)?;
    let _guard = ProfilerAggregator::activate();

    tracing::info!(work_ms, "Starting benchmark demo");

    profile_checkblock!(first);
    thread::sleep(work);
    stop_checkblock!(first);

    profile_checkblock!();

    let worker = Worker { work };
    worker.some_work();

    for _ in 0..5 {
        timed_step(work);
    }

    let results = profile_results!(["first", "missing"]);
    for (key, result) in &results {
        tracing::info!(key = key.as_str(), average_ns = result.average_ns(), "Filtered result");
    }

    Ok(())
}
