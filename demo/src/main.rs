//! CORDON SOC Reference Runtime — Demo CLI
//!
//! Runs one or all of the three SOC demo scenarios.  Each scenario uses real
//! CORDON components (catalog, runner, history) wired together with
//! simulated firewall/EDR/chat backends.
//!
//! Usage:
//!   cargo run -p demo -- run-all
//!   cargo run -p demo -- block-ip
//!   cargo run -p demo -- isolate-host
//!   cargo run -p demo -- failure-policies

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cordon_ref_soc::scenarios::{block_ip, dispatch_failure, isolate_host};

// ── CLI definition ────────────────────────────────────────────────────────────

/// CORDON — playbook execution engine for security incident response.
///
/// Each subcommand runs one or all of the three SOC scenarios,
/// demonstrating approvals, action dispatch, and failure policies.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "CORDON SOC reference runtime demo",
    long_about = "Runs CORDON SOC demo scenarios showing approval gates,\n\
                  action dispatch with parameter resolution, failure policies,\n\
                  and run history chain integrity."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run all three SOC scenarios in sequence.
    RunAll,
    /// Scenario 1: Block Malicious IP (approval → action → notification).
    BlockIp,
    /// Scenario 2: Isolate Compromised Host (unanimous two-approver gate).
    IsolateHost,
    /// Scenario 3: Failure Policies (fail-fast action, start-time validation).
    FailurePolicies,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Initialize structured logging.  Set RUST_LOG=debug for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    print_banner();

    let result = match cli.command {
        Command::RunAll => run_all(),
        Command::BlockIp => block_ip::run_scenario(),
        Command::IsolateHost => isolate_host::run_scenario(),
        Command::FailurePolicies => dispatch_failure::run_scenario(),
    };

    match result {
        Ok(()) => {
            println!("All selected scenarios completed successfully.");
        }
        Err(e) => {
            eprintln!("Demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Scenario dispatch ─────────────────────────────────────────────────────────

fn run_all() -> cordon_contracts::error::CordonResult<()> {
    block_ip::run_scenario()?;
    isolate_host::run_scenario()?;
    dispatch_failure::run_scenario()?;
    Ok(())
}

// ── Banner ────────────────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!("CORDON — Playbook Execution Engine");
    println!("SOC Reference Demo");
    println!("==================================");
    println!();
    println!("CORDON lifecycle per run:");
    println!("  [1] Parameter map validated against the playbook's ${{placeholder}} set");
    println!("  [2] Steps driven strictly in sequence, one at a time");
    println!("  [3] Approval steps suspend the run until EVERY approver signs off");
    println!("  [4] Action failures fail the run; notification failures only warn");
    println!("  [5] Terminal runs land in the SHA-256 hash-chained history");
    println!();
}
