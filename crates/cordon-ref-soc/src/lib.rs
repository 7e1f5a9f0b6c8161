//! # cordon-ref-soc
//!
//! SOC reference runtime for the CORDON playbook engine.
//!
//! Demonstrates three incident-response scenarios using simulated backends:
//!
//! 1. **Block Malicious IP** — the full approval → action → notification
//!    lifecycle with parameter resolution.
//! 2. **Isolate Compromised Host** — unanimous consent across two approvers,
//!    then two EDR actions in sequence.
//! 3. **Failure Policies** — fail-fast on a rejected action and start-time
//!    parameter validation.
//!
//! All backends are simulated. No external API calls are made.

pub mod dispatch;
pub mod scenarios;
