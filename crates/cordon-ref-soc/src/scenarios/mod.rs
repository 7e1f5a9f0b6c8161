//! Runnable SOC scenarios.
//!
//! Each module wires real CORDON components — catalog, runner, history —
//! to the simulated collaborators and walks one playbook lifecycle,
//! printing what a presentation layer would render.

pub mod block_ip;
pub mod dispatch_failure;
pub mod isolate_host;

use cordon_contracts::execution::Execution;

/// The catalog shared by every scenario.
pub const SOC_CATALOG: &str = include_str!("../../catalogs/soc.toml");

/// Print the progress view of a run: status, parameters, steps, and the
/// log tail.
pub(crate) fn print_run(execution: &Execution) {
    println!(
        "  Final status: {} ({}%)",
        execution.status,
        execution.progress()
    );

    if !execution.parameters.is_empty() {
        println!(
            "  Parameters: {}",
            serde_json::to_string(&execution.parameters).unwrap_or_default()
        );
    }

    println!("  Steps:");
    for step in &execution.steps {
        let result = step
            .result
            .as_ref()
            .map(|r| format!(" — {}", r.message))
            .unwrap_or_default();
        println!("    [{}] {} ({}){}", step.status, step.name, step.kind, result);
        if let Some(outcome) = &step.result {
            for (key, value) in &outcome.details {
                println!("        {}: {}", key, value);
            }
        }
    }

    println!("  Log:");
    for entry in &execution.logs {
        println!(
            "    {} [{}] {}",
            entry.timestamp.format("%H:%M:%S"),
            entry.level,
            entry.message
        );
    }
}
