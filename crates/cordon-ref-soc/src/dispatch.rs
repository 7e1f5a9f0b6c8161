//! Simulated SOC collaborators.
//!
//! These implementations stand in for the real firewall/EDR backends and
//! chat transports. They record every invocation so scenarios and tests can
//! inspect exactly what the runner dispatched, and return the canned result
//! payloads a real backend would produce. No external call is ever made.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use cordon_contracts::{
    error::CordonResult,
    execution::StepOutcome,
    step::ActionId,
};
use cordon_core::traits::{ActionDispatcher, Notifier};

/// A dispatcher that simulates the firewall and EDR action backends.
///
/// Known actions return success with realistic detail payloads; anything
/// else returns a failed outcome, which exercises the runner's fail-fast
/// path the same way a real misconfigured action would.
///
/// Clones share one call log, so one clone can be boxed into the runner
/// while another stays with the caller for inspection.
#[derive(Clone)]
pub struct SimulatedDispatcher {
    calls: Arc<Mutex<Vec<(String, BTreeMap<String, String>)>>>,
}

impl SimulatedDispatcher {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every invocation seen so far, as (action id, resolved parameters).
    pub fn invocations(&self) -> Vec<(String, BTreeMap<String, String>)> {
        self.calls
            .lock()
            .expect("dispatcher call log lock poisoned")
            .clone()
    }
}

impl Default for SimulatedDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionDispatcher for SimulatedDispatcher {
    fn invoke(
        &self,
        action: &ActionId,
        parameters: &BTreeMap<String, String>,
    ) -> CordonResult<StepOutcome> {
        self.calls
            .lock()
            .expect("dispatcher call log lock poisoned")
            .push((action.0.clone(), parameters.clone()));

        info!(action = %action.0, ?parameters, "simulated action dispatch");

        let outcome = match action.0.as_str() {
            "firewall.block_ip" => StepOutcome::ok("IP blocked successfully")
                .with_detail("firewall_rule_id", "rule123"),
            "edr.isolate_host" => StepOutcome::ok("Host isolated")
                .with_detail("containment_id", "cont-4471"),
            "edr.collect_forensics" => StepOutcome::ok("Forensics collection initiated")
                .with_detail("collection_job", "job-0017"),
            other => StepOutcome::failed(format!("no handler registered for action '{}'", other)),
        };

        Ok(outcome)
    }
}

/// A dispatcher whose every invocation fails with a fixed reason.
///
/// Used to demonstrate the fail-fast policy.
pub struct FailingDispatcher {
    reason: String,
}

impl FailingDispatcher {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ActionDispatcher for FailingDispatcher {
    fn invoke(
        &self,
        _action: &ActionId,
        _parameters: &BTreeMap<String, String>,
    ) -> CordonResult<StepOutcome> {
        Ok(StepOutcome::failed(self.reason.clone()))
    }
}

/// A notifier that records the rendered messages it would have delivered.
///
/// Clones share one call log, like `SimulatedDispatcher`.
#[derive(Clone)]
pub struct SimulatedNotifier {
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl SimulatedNotifier {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every message sent so far, as (channel, rendered message).
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .expect("notifier call log lock poisoned")
            .clone()
    }
}

impl Default for SimulatedNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for SimulatedNotifier {
    fn send(&self, channel: &str, message: &str) -> CordonResult<StepOutcome> {
        self.sent
            .lock()
            .expect("notifier call log lock poisoned")
            .push((channel.to_string(), message.to_string()));

        info!(channel = %channel, message = %message, "simulated notification");

        Ok(StepOutcome::ok(format!("Notification sent to {}", channel)))
    }
}

/// A notifier whose every send fails with a fixed reason.
///
/// Used to demonstrate the best-effort policy.
pub struct FailingNotifier {
    reason: String,
}

impl FailingNotifier {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Notifier for FailingNotifier {
    fn send(&self, _channel: &str, _message: &str) -> CordonResult<StepOutcome> {
        Ok(StepOutcome::failed(self.reason.clone()))
    }
}
