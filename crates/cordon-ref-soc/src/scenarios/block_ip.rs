//! Scenario 1: Block Malicious IP
//!
//! The full approval → action → notification lifecycle:
//!
//!   Step 1: approval by "admin"         → run suspends, then resumes on sign-off
//!   Step 2: firewall.block_ip           → dispatched with resolved ${ip_address}/${reason}
//!   Step 3: #security-alerts message    → rendered and delivered
//!
//! Demonstrates parameter resolution at step start, unanimous approval with
//! a single approver, the action result payload flowing into the step run,
//! and the terminal execution landing in the tamper-evident history.

use std::collections::BTreeMap;

use cordon_catalog::TomlCatalog;
use cordon_contracts::{
    error::{CordonError, CordonResult},
    execution::Execution,
    playbook::PlaybookId,
    step::ApproverId,
};
use cordon_core::Runner;
use cordon_history::InMemoryHistory;

use crate::dispatch::{SimulatedDispatcher, SimulatedNotifier};
use crate::scenarios::{print_run, SOC_CATALOG};

/// Drive the playbook end to end and return the terminal execution plus the
/// collaborator handles for inspection.
fn execute() -> CordonResult<(
    Execution,
    SimulatedDispatcher,
    SimulatedNotifier,
    InMemoryHistory,
)> {
    let catalog = TomlCatalog::from_toml_str(SOC_CATALOG)?;
    let playbook = catalog
        .get(&PlaybookId::new("block-malicious-ip"))
        .ok_or_else(|| CordonError::Catalog {
            reason: "playbook 'block-malicious-ip' not in catalog".to_string(),
        })?;

    let dispatcher = SimulatedDispatcher::new();
    let notifier = SimulatedNotifier::new();
    let history = InMemoryHistory::new();

    let runner = Runner::new(
        Box::new(dispatcher.clone()),
        Box::new(notifier.clone()),
        Box::new(history.clone()),
    );

    let mut parameters = BTreeMap::new();
    parameters.insert("ip_address".to_string(), "192.168.1.100".to_string());
    parameters.insert(
        "reason".to_string(),
        "Suspicious brute force attempts".to_string(),
    );

    let started = runner.start(playbook, parameters, "john.doe")?;
    runner.approve(&started.id, &ApproverId::new("admin"))?;

    let done = runner.status(&started.id)?;
    Ok((done, dispatcher, notifier, history))
}

/// Run the scenario, printing the walkthrough.
pub fn run_scenario() -> CordonResult<()> {
    println!("Scenario 1: Block Malicious IP");
    println!("------------------------------");
    println!("  Parameters: ip_address=192.168.1.100, reason=\"Suspicious brute force attempts\"");
    println!("  Triggered by john.doe; approving as admin…");
    println!();

    let (done, dispatcher, notifier, history) = execute()?;

    print_run(&done);

    for (action, params) in dispatcher.invocations() {
        println!("  Dispatched {} with {:?}", action, params);
    }
    for (channel, message) in notifier.sent() {
        println!("  Delivered to {}: {}", channel, message);
    }
    println!("  History chain valid: {}", history.verify_integrity());
    println!();

    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────
