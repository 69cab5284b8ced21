/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info, warn};

use sentry_sched::config::CatalogManager;
use sentry_sched::scheduler::{HybridScheduler, Strategy};
use sentry_sched::simulation::{self, generate_queue, generate_seeded_queue, Metrics};

// ── CLI argument definition ───────────────────────────────────────────────────

/// Edge Sentry predictive task scheduler.
///
/// Example:
///   sentry-sched --seed 7 compare
///   sentry-sched --config greenhouse.yaml explain --scenario "Drought Alert"
#[derive(Debug, Parser)]
#[command(
    name = "sentry-sched",
    about = "Edge Sentry – resource-aware predictive task scheduler",
    long_about = None,
)]
struct Cli {
    /// Path to a YAML task catalog / scheduler tuning file.
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Seed for queue generation (compare: random if omitted, explain: 42).
    #[arg(short = 's', long = "seed")]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run all three strategies on one generated queue per scenario.
    Compare {
        /// Override every scenario's queue length.
        #[arg(short = 'l', long = "length")]
        length: Option<usize>,
    },
    /// Step through the hybrid scheduler's decisions with explanations.
    Explain {
        /// Scenario to draw the queue from.
        #[arg(long = "scenario", default_value = "Routine Day")]
        scenario: String,

        /// Stop after this many decisions even if tasks remain.
        #[arg(long = "max-steps", default_value_t = 500)]
        max_steps: usize,
    },
}

const DEMO_SEED: u64 = 42;

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Level is controlled by the RUST_LOG env-var (e.g. RUST_LOG=debug).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        error!("{:#}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut manager = CatalogManager::new();
    match &cli.config {
        Some(path) => manager.load_from_file(path)?,
        None => warn!("No configuration file provided, using the built-in greenhouse catalog"),
    }

    match cli.command {
        Command::Compare { length } => run_compare(&manager, cli.seed, length),
        Command::Explain {
            scenario,
            max_steps,
        } => run_explain(&manager, cli.seed.unwrap_or(DEMO_SEED), &scenario, max_steps),
    }
}

// ── compare ───────────────────────────────────────────────────────────────────

fn run_compare(manager: &CatalogManager, seed: Option<u64>, length: Option<usize>) -> Result<()> {
    let catalog = Arc::new(manager.catalog().clone());
    let config = manager.scheduler_config();
    let mut rng = match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => StdRng::from_entropy(),
    };

    for scenario in manager.scenarios() {
        let length = length.unwrap_or(scenario.length);
        let queue = generate_queue(&scenario.pool, length, &catalog, &mut rng);
        info!(scenario = %scenario.name, task_count = queue.len(), "Analyzing all three strategies");

        let results = simulation::compare(&queue, Arc::clone(&catalog), config)
            .with_context(|| format!("Scenario '{}' failed", scenario.name))?;
        print_comparison(&scenario.name, &results);
    }
    Ok(())
}

fn print_comparison(name: &str, results: &[(Strategy, Metrics)]) {
    let rule = "=".repeat(108);
    println!("\n{rule}");
    println!("--- COMPARISON FOR: {name} ---");
    print!("{:<25}", "Metric");
    for (strategy, _) in results {
        print!(" | {:<25}", strategy_label(*strategy));
    }
    println!("\n{}", "-".repeat(108));

    let rows: Vec<_> = results.iter().map(|(_, m)| m.rows()).collect();
    if let Some(first) = rows.first() {
        for (i, (label, _)) in first.iter().enumerate() {
            print!("{label:<25}");
            for r in &rows {
                print!(" | {:<25}", r[i].1);
            }
            println!();
        }
    }
    println!("{rule}");
}

fn strategy_label(strategy: Strategy) -> &'static str {
    match strategy {
        Strategy::RoundRobin => "Round Robin (FCFS)",
        Strategy::StrictPriority => "Strict Priority (Greedy)",
        Strategy::Hybrid => "Intelligent (Predictive)",
    }
}

// ── explain ───────────────────────────────────────────────────────────────────

fn run_explain(manager: &CatalogManager, seed: u64, scenario: &str, max_steps: usize) -> Result<()> {
    let scenario = manager
        .scenario(scenario)
        .with_context(|| format!("Unknown scenario: '{scenario}'"))?;

    let catalog = Arc::new(manager.catalog().clone());
    let mut queue = generate_seeded_queue(&scenario.pool, scenario.length, &catalog, seed);
    let mut scheduler = HybridScheduler::new(Arc::clone(&catalog), *manager.scheduler_config());

    info!(scenario = %scenario.name, seed, task_count = queue.len(), "=== Explainability demo ===");

    let mut step = 0usize;
    while !queue.is_empty() && step < max_steps {
        step += 1;
        let state = scheduler.state();
        info!("--- Step {step} ---");
        info!(
            "Current State: CPU: {:.2}%, Mem: {:.2} bytes",
            state.processing_load, state.memory_load
        );
        info!("Tasks waiting (first 5):");
        for entry in queue.iter().take(5) {
            info!(
                "  - {} (P:{}, W:{})",
                entry.type_name, entry.priority, entry.time_in_queue
            );
        }

        let Some(decision) = scheduler.decide(&queue, true) else {
            break;
        };
        info!(">>> Decision: {decision}");
        scheduler.apply(&decision, &mut queue);
    }

    if !queue.is_empty() {
        warn!(pending = queue.len(), max_steps, "Step limit reached before the queue drained");
    }
    info!("EXPLAINABILITY DEMO FINISHED.");
    Ok(())
}
