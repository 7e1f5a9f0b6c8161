//! Scenario 3: Failure Policies
//!
//! Three sub-cases on the Block Malicious IP playbook:
//!
//! Sub-case A (fail-fast): the firewall backend rejects the block. The
//! execution fails the moment the action step fails and the notification
//! step never leaves `Pending` — nobody is told an IP was blocked when it
//! was not.
//!
//! Sub-case B (validation): the run is started without `ip_address`. The
//! execution fails in `Preparing`, before any dispatcher or notifier call,
//! and the failed run still lands in history.
//!
//! Sub-case C (best-effort): the chat transport is down. The block itself
//! succeeded, so the run still completes — the delivery failure is a
//! warning on the log and a non-success result on the step.

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

use crate::dispatch::{FailingDispatcher, FailingNotifier, SimulatedDispatcher, SimulatedNotifier};
use crate::scenarios::{print_run, SOC_CATALOG};

/// Sub-case A: approve the block, then watch the firewall dispatch fail.
fn execute_failed_dispatch() -> CordonResult<(Execution, SimulatedNotifier)> {
    let catalog = TomlCatalog::from_toml_str(SOC_CATALOG)?;
    let playbook = catalog
        .get(&PlaybookId::new("block-malicious-ip"))
        .ok_or_else(|| CordonError::Catalog {
            reason: "playbook 'block-malicious-ip' not in catalog".to_string(),
        })?;

    let notifier = SimulatedNotifier::new();
    let runner = Runner::new(
        Box::new(FailingDispatcher::new("firewall API returned 500")),
        Box::new(notifier.clone()),
        Box::new(InMemoryHistory::new()),
    );

    let mut parameters = BTreeMap::new();
    parameters.insert("ip_address".to_string(), "192.168.1.100".to_string());
    parameters.insert("reason".to_string(), "Suspicious brute force attempts".to_string());

    let started = runner.start(playbook, parameters, "john.doe")?;
    runner.approve(&started.id, &ApproverId::new("admin"))?;

    Ok((runner.status(&started.id)?, notifier))
}

/// Sub-case B: start without the required `ip_address` parameter.
fn execute_missing_parameter() -> (CordonResult<Execution>, SimulatedDispatcher, InMemoryHistory) {
    let catalog = match TomlCatalog::from_toml_str(SOC_CATALOG) {
        Ok(catalog) => catalog,
        Err(err) => return (Err(err), SimulatedDispatcher::new(), InMemoryHistory::new()),
    };
    let dispatcher = SimulatedDispatcher::new();
    let history = InMemoryHistory::new();

    let runner = Runner::new(
        Box::new(dispatcher.clone()),
        Box::new(SimulatedNotifier::new()),
        Box::new(history.clone()),
    );

    let result = catalog
        .get(&PlaybookId::new("block-malicious-ip"))
        .ok_or_else(|| CordonError::Catalog {
            reason: "playbook 'block-malicious-ip' not in catalog".to_string(),
        })
        .and_then(|playbook| runner.start(playbook, BTreeMap::new(), "john.doe"));

    (result, dispatcher, history)
}

/// Sub-case C: the block succeeds but the notification transport is down.
fn execute_failed_notification() -> CordonResult<Execution> {
    let catalog = TomlCatalog::from_toml_str(SOC_CATALOG)?;
    let playbook = catalog
        .get(&PlaybookId::new("block-malicious-ip"))
        .ok_or_else(|| CordonError::Catalog {
            reason: "playbook 'block-malicious-ip' not in catalog".to_string(),
        })?;

    let runner = Runner::new(
        Box::new(SimulatedDispatcher::new()),
        Box::new(FailingNotifier::new("slack webhook returned 404")),
        Box::new(InMemoryHistory::new()),
    );

    let mut parameters = BTreeMap::new();
    parameters.insert("ip_address".to_string(), "192.168.1.100".to_string());
    parameters.insert("reason".to_string(), "Suspicious brute force attempts".to_string());

    let started = runner.start(playbook, parameters, "john.doe")?;
    runner.approve(&started.id, &ApproverId::new("admin"))?;

    runner.status(&started.id)
}

/// Run all three sub-cases, printing the walkthrough.
pub fn run_scenario() -> CordonResult<()> {
    println!("Scenario 3: Failure Policies");
    println!("----------------------------");

    println!("  Sub-case A — firewall backend fails the block (fail-fast):");
    let (failed, notifier) = execute_failed_dispatch()?;
    print_run(&failed);
    println!(
        "  Notifications delivered: {} (none — the failed action halted the run)",
        notifier.sent().len()
    );
    println!();

    println!("  Sub-case B — started without ip_address (validation):");
    let (result, dispatcher, history) = execute_missing_parameter();
    match result {
        Err(CordonError::ParameterValidation { missing }) => {
            println!("  Rejected before any step: missing {:?}", missing);
        }
        Err(other) => return Err(other),
        Ok(_) => println!("  Unexpected: validation passed"),
    }
    println!(
        "  Dispatcher invocations: {}; failed run recorded to history: {}",
        dispatcher.invocations().len(),
        history.len()
    );
    println!();

    println!("  Sub-case C — chat transport down (best-effort):");
    let completed = execute_failed_notification()?;
    print_run(&completed);
    println!();

    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────
