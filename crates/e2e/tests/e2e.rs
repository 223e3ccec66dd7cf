//! E2E scenario harness entry point
//!
//! Runs the YAML scenarios under `crates/e2e/specs` against the fake backend.
//! Run with: cargo test --package seatwise-e2e --test e2e

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use seatwise_e2e::runner::{RunnerConfig, TestSuiteResult};
use seatwise_e2e::server::ServerConfig;
use seatwise_e2e::{E2eResult, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "seatwise-e2e")]
#[command(about = "E2E scenario runner for Seatwise")]
struct Args {
    /// Path to scenario specs directory
    #[arg(short, long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/specs"))]
    specs: PathBuf,

    /// Run only scenarios matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific scenario by name
    #[arg(short, long)]
    name: Option<String>,

    /// Port to run the fake backend on (0 = auto)
    #[arg(long, default_value = "0")]
    port: u16,

    /// Start without the standard dining room
    #[arg(long)]
    empty: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // `cargo test` may forward libtest flags; fall back to defaults for those
    let args = Args::try_parse().unwrap_or_else(|_| Args::parse_from(["seatwise-e2e"]));

    let rt = tokio::runtime::Runtime::new().expect("Failed to create tokio runtime");
    let result = rt.block_on(async_main(args));

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let config = RunnerConfig {
        server: ServerConfig {
            port: if args.port == 0 { None } else { Some(args.port) },
            seed_courses: !args.empty,
            ..Default::default()
        },
        specs_dir: args.specs,
        output_dir: args.output,
    };

    let mut runner = TestRunner::with_config(config);
    runner.start_server().await?;

    let results = if let Some(name) = args.name {
        let result = runner.run_test(&name).await?;
        TestSuiteResult {
            total: 1,
            passed: usize::from(result.success),
            failed: usize::from(!result.success),
            skipped: 0,
            duration_ms: result.duration_ms,
            results: vec![result],
        }
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;

    Ok(results.failed == 0)
}
