//! Scenario 2: Isolate Compromised Host
//!
//! Exercises the unanimous multi-approver policy:
//!
//!   Step 1: approval by "admin" AND "security-lead" — one approval alone
//!           leaves the run suspended
//!   Step 2: edr.isolate_host with ${host_id}/${isolation_level}
//!   Step 3: edr.collect_forensics (collection_type is a literal, not a
//!           template)
//!   Step 4: #security-incidents message
//!
//! The intermediate snapshot after the first approval is captured so the
//! walkthrough can show the run still waiting.

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

/// Drive the playbook through both approvals. Returns the snapshot taken
/// between the approvals, the terminal execution, and the dispatcher handle.
fn execute() -> CordonResult<(Execution, Execution, SimulatedDispatcher)> {
    let catalog = TomlCatalog::from_toml_str(SOC_CATALOG)?;
    let playbook = catalog
        .get(&PlaybookId::new("isolate-host"))
        .ok_or_else(|| CordonError::Catalog {
            reason: "playbook 'isolate-host' not in catalog".to_string(),
        })?;

    let dispatcher = SimulatedDispatcher::new();
    let runner = Runner::new(
        Box::new(dispatcher.clone()),
        Box::new(SimulatedNotifier::new()),
        Box::new(InMemoryHistory::new()),
    );

    let mut parameters = BTreeMap::new();
    parameters.insert("host_id".to_string(), "DESKTOP-ABC123".to_string());
    parameters.insert("isolation_level".to_string(), "full".to_string());

    let started = runner.start(playbook, parameters, "jane.smith")?;

    runner.approve(&started.id, &ApproverId::new("admin"))?;
    let after_first = runner.status(&started.id)?;

    runner.approve(&started.id, &ApproverId::new("security-lead"))?;
    let done = runner.status(&started.id)?;

    Ok((after_first, done, dispatcher))
}

/// Run the scenario, printing the walkthrough.
pub fn run_scenario() -> CordonResult<()> {
    println!("Scenario 2: Isolate Compromised Host");
    println!("------------------------------------");
    println!("  Parameters: host_id=DESKTOP-ABC123, isolation_level=full");
    println!("  Approvers: admin, security-lead (unanimous consent required)");
    println!();

    let (after_first, done, dispatcher) = execute()?;

    println!(
        "  After admin approval: {} — approved so far: {:?}",
        after_first.status,
        after_first.steps[0]
            .approved_by
            .iter()
            .map(|a| a.0.as_str())
            .collect::<Vec<_>>()
    );
    println!("  After security-lead approval:");
    println!();

    print_run(&done);

    for (action, params) in dispatcher.invocations() {
        println!("  Dispatched {} with {:?}", action, params);
    }
    println!();

    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────────────────
