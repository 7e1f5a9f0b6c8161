//! The CORDON runner: the sequential playbook step driver.
//!
//! The runner enforces the CORDON execution model:
//!
//!   Validate → [per step: Approve | Dispatch | Notify] → Terminal → Record
//!
//! Steps execute strictly one at a time, in sequence order. The runner
//! suspends only while awaiting an external call's result or an approval
//! signal. Two policies are absolute:
//!
//! - **Fail-fast actions**: an action step's failure immediately fails the
//!   execution; no later step ever leaves `Pending`.
//! - **Best-effort notifications**: a notification step's failure is logged
//!   as a warning and the execution continues.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use cordon_contracts::{
    error::{CordonError, CordonResult},
    execution::{Execution, ExecutionId, ExecutionStatus, LogLevel, StepOutcome, StepStatus},
    playbook::PlaybookDefinition,
    step::{ActionId, ApproverId, StepConfig, StepDefinition},
    template,
};

use crate::traits::{ActionDispatcher, Notifier, RunRecorder};

// ── Internal per-execution state ──────────────────────────────────────────────

/// Everything the runner tracks for one live execution.
///
/// Kept behind its own `Mutex` so `approve`/`cancel` calls arriving from
/// outside are serialized against a mid-drive runner. Independent executions
/// never share one of these.
struct ExecutionState {
    execution: Execution,
    /// Step definitions snapshotted at start time. Editing the playbook
    /// after a run started never changes this.
    steps: Vec<StepDefinition>,
    /// Index of the next step to start.
    cursor: usize,
}

// ── Runner ────────────────────────────────────────────────────────────────────

/// Drives executions from `Preparing` to a terminal state.
///
/// One runner owns the trusted collaborators — dispatcher, notifier,
/// recorder — and every execution started through it. Multiple executions
/// may run concurrently and independently; each owns its state exclusively.
pub struct Runner {
    dispatcher: Box<dyn ActionDispatcher>,
    notifier: Box<dyn Notifier>,
    recorder: Box<dyn RunRecorder>,
    executions: Mutex<HashMap<ExecutionId, Arc<Mutex<ExecutionState>>>>,
}

impl Runner {
    /// Create a runner with the given collaborators.
    pub fn new(
        dispatcher: Box<dyn ActionDispatcher>,
        notifier: Box<dyn Notifier>,
        recorder: Box<dyn RunRecorder>,
    ) -> Self {
        Self {
            dispatcher,
            notifier,
            recorder,
            executions: Mutex::new(HashMap::new()),
        }
    }

    /// Start a new execution of `playbook` with the supplied parameter map.
    ///
    /// Validates the map against the playbook's required parameter set
    /// first. A missing token fails the execution before any step runs:
    /// the failed run is still registered and recorded to history, and
    /// `CordonError::ParameterValidation` is returned.
    ///
    /// On success the runner drives steps synchronously until the execution
    /// reaches a terminal state or parks on an approval step, then returns a
    /// snapshot. An action failure mid-run is *not* an `Err` — it is
    /// reported through the snapshot's `Failed` status, its step results,
    /// and the run log.
    pub fn start(
        &self,
        playbook: &PlaybookDefinition,
        parameters: BTreeMap<String, String>,
        triggered_by: impl Into<String>,
    ) -> CordonResult<Execution> {
        let mut execution = Execution::new(playbook, parameters, triggered_by);
        execution.log(LogLevel::Info, "Playbook execution started");

        info!(
            execution_id = %execution.id.0,
            playbook_id = %playbook.id().0,
            triggered_by = %execution.triggered_by,
            "execution created"
        );

        // Parameter validation: the supplied key set must cover every
        // distinct `${name}` token across the playbook's templates.
        let missing: Vec<String> = playbook
            .required_parameters()
            .into_iter()
            .filter(|name| !execution.parameters.contains_key(name))
            .collect();

        if !missing.is_empty() {
            let err = CordonError::ParameterValidation { missing };
            execution.log(LogLevel::Error, err.to_string());
            execution.status = ExecutionStatus::Failed;
            execution.completed_at = Some(Utc::now());

            warn!(
                execution_id = %execution.id.0,
                error = %err,
                "parameter validation failed"
            );

            self.record_terminal(&execution);
            self.register(execution, playbook);
            return Err(err);
        }

        let state = self.register(execution, playbook);
        self.drive(&state);

        let st = state.lock().expect("execution state lock poisoned");
        Ok(st.execution.clone())
    }

    /// Record an approval for the execution's current approval step.
    ///
    /// # Errors
    ///
    /// - `UnknownExecution` — the id is not registered with this runner.
    /// - `InvalidStateTransition` — the execution is not awaiting approval.
    /// - `NotAnApprover` — `approver` is not in the step's approver set;
    ///   the execution's state is unchanged.
    ///
    /// A duplicate approval by an already-recorded identity is accepted and
    /// ignored. When the recorded set covers the full approver set, the
    /// approval step completes and the runner continues driving subsequent
    /// steps before returning.
    pub fn approve(&self, execution_id: &ExecutionId, approver: &ApproverId) -> CordonResult<()> {
        let state = self.lookup(execution_id)?;

        let resume = {
            let mut st = state.lock().expect("execution state lock poisoned");

            if st.execution.status != ExecutionStatus::AwaitingApproval {
                return Err(CordonError::InvalidStateTransition {
                    operation: "approve".to_string(),
                    status: st.execution.status,
                });
            }

            let cursor = st.cursor;
            let step = st.steps[cursor].clone();
            let StepConfig::Approval { approvers } = &step.config else {
                // AwaitingApproval implies the current step is an approval.
                return Err(CordonError::InvalidStateTransition {
                    operation: "approve".to_string(),
                    status: st.execution.status,
                });
            };

            if !approvers.contains(approver) {
                return Err(CordonError::NotAnApprover {
                    identity: approver.0.clone(),
                    step: step.id.0.clone(),
                });
            }

            if st.execution.steps[cursor].approved_by.contains(approver) {
                // Re-sending an approval is not a protocol violation.
                return Ok(());
            }

            st.execution.steps[cursor].approved_by.push(approver.clone());
            st.execution
                .log(LogLevel::Info, format!("Approved by {}", approver.0));

            info!(
                execution_id = %st.execution.id.0,
                step_id = %step.id.0,
                approver = %approver.0,
                "approval recorded"
            );

            // Unanimous consent: every listed approver must have signed off.
            let satisfied = approvers
                .iter()
                .all(|a| st.execution.steps[cursor].approved_by.contains(a));

            if satisfied {
                let approved = st.execution.steps[cursor]
                    .approved_by
                    .iter()
                    .map(|a| a.0.clone())
                    .collect::<Vec<_>>()
                    .join(", ");

                let run = &mut st.execution.steps[cursor];
                run.status = StepStatus::Completed;
                run.completed_at = Some(Utc::now());
                run.result = Some(StepOutcome::ok(format!("Approved by {}", approved)));

                st.cursor += 1;
                st.execution.status = ExecutionStatus::Running;
                st.execution
                    .log(LogLevel::Info, "All required approvals received");
            }

            satisfied
        };

        if resume {
            self.drive(&state);
        }
        Ok(())
    }

    /// Cancel a non-terminal execution.
    ///
    /// Any in-flight step is marked `Failed` with reason "cancelled"; no
    /// further steps start. Cancelling an already-terminal execution returns
    /// `InvalidStateTransition` and leaves status and logs unchanged.
    /// Cancellation is cooperative — it never aborts an in-flight external
    /// call; the dispatcher's own timeout contract governs that.
    pub fn cancel(&self, execution_id: &ExecutionId) -> CordonResult<()> {
        let state = self.lookup(execution_id)?;
        let mut st = state.lock().expect("execution state lock poisoned");

        if st.execution.status.is_terminal() {
            return Err(CordonError::InvalidStateTransition {
                operation: "cancel".to_string(),
                status: st.execution.status,
            });
        }

        for run in &mut st.execution.steps {
            if run.status == StepStatus::Running {
                run.status = StepStatus::Failed;
                run.completed_at = Some(Utc::now());
                run.result = Some(StepOutcome::failed("cancelled"));
            }
        }

        st.execution.status = ExecutionStatus::Cancelled;
        st.execution.completed_at = Some(Utc::now());
        st.execution
            .log(LogLevel::Warning, "Execution cancelled by user");

        info!(execution_id = %st.execution.id.0, "execution cancelled");

        self.record_terminal(&st.execution);
        Ok(())
    }

    /// A read-only snapshot of the execution's current state.
    ///
    /// The returned value is a clone; mutating it has no effect on the run.
    pub fn status(&self, execution_id: &ExecutionId) -> CordonResult<Execution> {
        let state = self.lookup(execution_id)?;
        let st = state.lock().expect("execution state lock poisoned");
        Ok(st.execution.clone())
    }

    // ── Internals ─────────────────────────────────────────────────────────────

    fn register(
        &self,
        execution: Execution,
        playbook: &PlaybookDefinition,
    ) -> Arc<Mutex<ExecutionState>> {
        let id = execution.id.clone();
        let state = Arc::new(Mutex::new(ExecutionState {
            execution,
            steps: playbook.steps().to_vec(),
            cursor: 0,
        }));
        self.executions
            .lock()
            .expect("runner registry lock poisoned")
            .insert(id, Arc::clone(&state));
        state
    }

    fn lookup(&self, execution_id: &ExecutionId) -> CordonResult<Arc<Mutex<ExecutionState>>> {
        self.executions
            .lock()
            .expect("runner registry lock poisoned")
            .get(execution_id)
            .cloned()
            .ok_or_else(|| CordonError::UnknownExecution {
                id: execution_id.0.to_string(),
            })
    }

    /// Drive the execution forward until it reaches a terminal state or
    /// parks on an approval step.
    ///
    /// Holds the execution's lock for the duration, including across
    /// dispatcher/notifier calls — `approve`/`cancel` callers queue behind
    /// the current step and observe a consistent state.
    fn drive(&self, state: &Arc<Mutex<ExecutionState>>) {
        let mut st = state.lock().expect("execution state lock poisoned");

        loop {
            if st.execution.status.is_terminal() {
                return;
            }

            if st.cursor >= st.steps.len() {
                st.execution.status = ExecutionStatus::Completed;
                st.execution.completed_at = Some(Utc::now());
                st.execution
                    .log(LogLevel::Info, "Playbook execution completed");

                info!(execution_id = %st.execution.id.0, "execution completed");

                self.record_terminal(&st.execution);
                return;
            }

            let cursor = st.cursor;
            let step = st.steps[cursor].clone();

            match &step.config {
                // ── Approval: park until every approver signs off ────────────
                StepConfig::Approval { approvers } => {
                    if st.execution.steps[cursor].status == StepStatus::Pending {
                        st.execution.status = ExecutionStatus::AwaitingApproval;

                        let run = &mut st.execution.steps[cursor];
                        run.status = StepStatus::Running;
                        run.started_at = Some(Utc::now());

                        let names = approvers
                            .iter()
                            .map(|a| a.0.as_str())
                            .collect::<Vec<_>>()
                            .join(", ");
                        st.execution.log(
                            LogLevel::Info,
                            format!("Waiting for approval from {}", names),
                        );

                        info!(
                            execution_id = %st.execution.id.0,
                            step_id = %step.id.0,
                            approvers = %names,
                            "execution suspended awaiting approval"
                        );
                    }
                    return;
                }

                // ── Action: dispatch, fail-fast on failure ───────────────────
                StepConfig::Action { action, parameters } => {
                    st.execution.status = ExecutionStatus::Running;
                    {
                        let run = &mut st.execution.steps[cursor];
                        run.status = StepStatus::Running;
                        run.started_at = Some(Utc::now());
                    }
                    st.execution
                        .log(LogLevel::Info, format!("Executing action {}", action.0));

                    debug!(
                        execution_id = %st.execution.id.0,
                        step_id = %step.id.0,
                        action = %action.0,
                        "dispatching action"
                    );

                    match self.invoke_action(&st.execution.parameters, action, parameters) {
                        Ok(outcome) if outcome.success => {
                            let message = outcome.message.clone();
                            let run = &mut st.execution.steps[cursor];
                            run.status = StepStatus::Completed;
                            run.completed_at = Some(Utc::now());
                            run.result = Some(outcome);

                            st.execution.log(
                                LogLevel::Info,
                                format!("Action {} completed: {}", action.0, message),
                            );
                            st.cursor += 1;
                        }
                        Ok(outcome) => {
                            let err = CordonError::DispatchFailed {
                                action: action.0.clone(),
                                reason: outcome.message.clone(),
                            };
                            self.fail(&mut st, cursor, err, Some(outcome));
                            return;
                        }
                        Err(source) => {
                            let err = CordonError::DispatchFailed {
                                action: action.0.clone(),
                                reason: source.to_string(),
                            };
                            self.fail(&mut st, cursor, err, None);
                            return;
                        }
                    }
                }

                // ── Notification: best-effort ────────────────────────────────
                StepConfig::Notification { channel, message } => {
                    st.execution.status = ExecutionStatus::Running;
                    {
                        let run = &mut st.execution.steps[cursor];
                        run.status = StepStatus::Running;
                        run.started_at = Some(Utc::now());
                    }
                    st.execution.log(
                        LogLevel::Info,
                        format!("Sending notification to {}", channel),
                    );

                    let outcome = template::render(message, &st.execution.parameters)
                        .and_then(|rendered| self.notifier.send(channel, &rendered))
                        .unwrap_or_else(|err| StepOutcome::failed(err.to_string()));

                    if outcome.success {
                        st.execution
                            .log(LogLevel::Info, format!("Notification sent to {}", channel));
                    } else {
                        // A notification failure never fails the run.
                        st.execution.log(
                            LogLevel::Warning,
                            format!("Notification to {} failed: {}", channel, outcome.message),
                        );
                        warn!(
                            execution_id = %st.execution.id.0,
                            step_id = %step.id.0,
                            channel = %channel,
                            reason = %outcome.message,
                            "notification dispatch failed"
                        );
                    }

                    let run = &mut st.execution.steps[cursor];
                    run.status = StepStatus::Completed;
                    run.completed_at = Some(Utc::now());
                    run.result = Some(outcome);
                    st.cursor += 1;
                }
            }
        }
    }

    /// Resolve an action step's parameter templates and invoke the
    /// dispatcher. Rendering happens here, at the moment the step begins —
    /// never at execution-creation time.
    fn invoke_action(
        &self,
        execution_parameters: &BTreeMap<String, String>,
        action: &ActionId,
        templates: &BTreeMap<String, String>,
    ) -> CordonResult<StepOutcome> {
        let mut resolved = BTreeMap::new();
        for (key, tpl) in templates {
            resolved.insert(key.clone(), template::render(tpl, execution_parameters)?);
        }
        self.dispatcher.invoke(action, &resolved)
    }

    /// Mark the step at `cursor` failed, fail the whole execution, and
    /// record it. Remaining steps stay `Pending`.
    fn fail(
        &self,
        st: &mut ExecutionState,
        cursor: usize,
        err: CordonError,
        outcome: Option<StepOutcome>,
    ) {
        let run = &mut st.execution.steps[cursor];
        run.status = StepStatus::Failed;
        run.completed_at = Some(Utc::now());
        run.result = Some(outcome.unwrap_or_else(|| StepOutcome::failed(err.to_string())));

        st.execution.status = ExecutionStatus::Failed;
        st.execution.completed_at = Some(Utc::now());
        st.execution.log(LogLevel::Error, err.to_string());

        warn!(
            execution_id = %st.execution.id.0,
            error = %err,
            "execution failed"
        );

        self.record_terminal(&st.execution);
    }

    /// Append a terminal execution to the history sink.
    ///
    /// A recorder failure is logged but never alters the already-terminal
    /// status.
    fn record_terminal(&self, execution: &Execution) {
        if let Err(err) = self.recorder.record(execution) {
            error!(
                execution_id = %execution.id.0,
                error = %err,
                "failed to record terminal execution"
            );
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use cordon_contracts::{
        error::{CordonError, CordonResult},
        execution::{Execution, ExecutionId, ExecutionStatus, LogLevel, StepOutcome, StepStatus},
        playbook::{PlaybookDefinition, PlaybookId},
        step::{ActionId, ApproverId, StepConfig, StepDefinition, StepId},
    };

    use crate::traits::{ActionDispatcher, Notifier, RunRecorder};

    use super::Runner;

    // ── Fixtures ─────────────────────────────────────────────────────────────

    fn step(id: &str, name: &str, config: StepConfig) -> StepDefinition {
        StepDefinition {
            id: StepId::new(id),
            name: name.to_string(),
            config,
        }
    }

    fn approval(id: &str, approvers: &[&str]) -> StepDefinition {
        step(
            id,
            "Get approval",
            StepConfig::Approval {
                approvers: approvers.iter().map(|a| ApproverId::new(*a)).collect(),
            },
        )
    }

    /// The canonical playbook: approval → firewall action → notification.
    fn block_ip_playbook() -> PlaybookDefinition {
        PlaybookDefinition::new(
            PlaybookId::new("block-malicious-ip"),
            "Block Malicious IP",
            "Blocks an IP address across all firewalls and sends notification",
            "John Doe",
            vec![
                approval("step1", &["admin"]),
                step(
                    "step2",
                    "Block IP on Firewall",
                    StepConfig::Action {
                        action: ActionId::new("firewall.block_ip"),
                        parameters: [("ip".to_string(), "${ip_address}".to_string())]
                            .into_iter()
                            .collect(),
                    },
                ),
                step(
                    "step3",
                    "Send Slack notification",
                    StepConfig::Notification {
                        channel: "#security-alerts".to_string(),
                        message: "IP ${ip_address} blocked".to_string(),
                    },
                ),
            ],
        )
        .unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    // ── Mock collaborators ───────────────────────────────────────────────────

    /// A dispatcher that returns a pre-configured outcome and records every
    /// invocation for later inspection.
    struct MockDispatcher {
        outcome: StepOutcome,
        calls: Arc<Mutex<Vec<(String, BTreeMap<String, String>)>>>,
    }

    impl MockDispatcher {
        fn succeeding() -> Self {
            Self {
                outcome: StepOutcome::ok("IP blocked successfully")
                    .with_detail("firewall_rule_id", "rule123"),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                outcome: StepOutcome::failed(reason),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    impl ActionDispatcher for MockDispatcher {
        fn invoke(
            &self,
            action: &ActionId,
            parameters: &BTreeMap<String, String>,
        ) -> CordonResult<StepOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push((action.0.clone(), parameters.clone()));
            Ok(self.outcome.clone())
        }
    }

    /// A dispatcher whose transport itself errors.
    struct ErroringDispatcher;

    impl ActionDispatcher for ErroringDispatcher {
        fn invoke(
            &self,
            action: &ActionId,
            _parameters: &BTreeMap<String, String>,
        ) -> CordonResult<StepOutcome> {
            Err(CordonError::DispatchFailed {
                action: action.0.clone(),
                reason: "connection refused".to_string(),
            })
        }
    }

    /// A notifier that returns a pre-configured outcome and records calls.
    struct MockNotifier {
        outcome: StepOutcome,
        calls: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl MockNotifier {
        fn succeeding() -> Self {
            Self {
                outcome: StepOutcome::ok("notification sent"),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }

        fn failing(reason: &str) -> Self {
            Self {
                outcome: StepOutcome::failed(reason),
                calls: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    impl Notifier for MockNotifier {
        fn send(&self, channel: &str, message: &str) -> CordonResult<StepOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push((channel.to_string(), message.to_string()));
            Ok(self.outcome.clone())
        }
    }

    /// A recorder that keeps every terminal execution for inspection.
    struct MockRecorder {
        records: Arc<Mutex<Vec<Execution>>>,
    }

    impl MockRecorder {
        fn new() -> Self {
            Self {
                records: Arc::new(Mutex::new(vec![])),
            }
        }
    }

    impl RunRecorder for MockRecorder {
        fn record(&self, execution: &Execution) -> CordonResult<()> {
            self.records.lock().unwrap().push(execution.clone());
            Ok(())
        }
    }

    // ── Test cases ───────────────────────────────────────────────────────────

    /// End-to-end lifecycle: approval suspends, approving drives the action
    /// with resolved parameters, the notifier gets the rendered message, and
    /// the run completes.
    #[test]
    fn test_block_ip_happy_path() {
        let dispatcher = MockDispatcher::succeeding();
        let dispatcher_calls = dispatcher.calls.clone();
        let notifier = MockNotifier::succeeding();
        let notifier_calls = notifier.calls.clone();
        let recorder = MockRecorder::new();
        let records = recorder.records.clone();

        let runner = Runner::new(
            Box::new(dispatcher),
            Box::new(notifier),
            Box::new(recorder),
        );

        let playbook = block_ip_playbook();
        let snapshot = runner
            .start(&playbook, params(&[("ip_address", "10.0.0.5")]), "john.doe")
            .unwrap();

        // Parked on the approval step; nothing dispatched yet.
        assert_eq!(snapshot.status, ExecutionStatus::AwaitingApproval);
        assert_eq!(snapshot.steps[0].status, StepStatus::Running);
        assert!(dispatcher_calls.lock().unwrap().is_empty());

        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();

        // The dispatcher saw the resolved parameters.
        {
            let calls = dispatcher_calls.lock().unwrap();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].0, "firewall.block_ip");
            assert_eq!(calls[0].1["ip"], "10.0.0.5");
        }

        // The notifier saw the rendered message.
        {
            let calls = notifier_calls.lock().unwrap();
            assert_eq!(calls.len(), 1);
            assert_eq!(calls[0].0, "#security-alerts");
            assert_eq!(calls[0].1, "IP 10.0.0.5 blocked");
        }

        let done = runner.status(&snapshot.id).unwrap();
        assert_eq!(done.status, ExecutionStatus::Completed);
        assert_eq!(done.progress(), 100);
        assert!(done.completed_at.is_some());
        assert!(done
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Completed));

        // The action's result payload is attached verbatim.
        let action_result = done.steps[1].result.as_ref().unwrap();
        assert!(action_result.success);
        assert_eq!(action_result.details["firewall_rule_id"], "rule123");

        // Exactly one terminal record was handed to the history sink.
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ExecutionStatus::Completed);
    }

    /// A missing required parameter fails the run before any step starts:
    /// no dispatcher or notifier call is ever made.
    #[test]
    fn test_missing_parameter_fails_before_any_step() {
        let dispatcher = MockDispatcher::succeeding();
        let dispatcher_calls = dispatcher.calls.clone();
        let notifier = MockNotifier::succeeding();
        let notifier_calls = notifier.calls.clone();
        let recorder = MockRecorder::new();
        let records = recorder.records.clone();

        let runner = Runner::new(
            Box::new(dispatcher),
            Box::new(notifier),
            Box::new(recorder),
        );

        let err = runner
            .start(&block_ip_playbook(), params(&[]), "john.doe")
            .unwrap_err();

        match err {
            CordonError::ParameterValidation { missing } => {
                assert_eq!(missing, vec!["ip_address".to_string()]);
            }
            other => panic!("expected ParameterValidation, got {:?}", other),
        }

        assert!(dispatcher_calls.lock().unwrap().is_empty());
        assert!(notifier_calls.lock().unwrap().is_empty());

        // The failed run is still recorded, with every step untouched.
        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].status, ExecutionStatus::Failed);
        assert!(records[0]
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Pending));
    }

    /// Unanimous consent: with two approvers, one approval keeps the run
    /// suspended; the second releases it.
    #[test]
    fn test_approval_requires_every_approver() {
        let playbook = PlaybookDefinition::new(
            PlaybookId::new("isolate-host"),
            "Isolate Compromised Host",
            "",
            "Jane Smith",
            vec![approval("step1", &["admin", "security-lead"])],
        )
        .unwrap();

        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner.start(&playbook, params(&[]), "jane").unwrap();
        assert_eq!(snapshot.status, ExecutionStatus::AwaitingApproval);

        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();
        let mid = runner.status(&snapshot.id).unwrap();
        assert_eq!(mid.status, ExecutionStatus::AwaitingApproval);
        assert_eq!(mid.steps[0].approved_by, vec![ApproverId::new("admin")]);

        runner
            .approve(&snapshot.id, &ApproverId::new("security-lead"))
            .unwrap();
        let done = runner.status(&snapshot.id).unwrap();
        assert_eq!(done.status, ExecutionStatus::Completed);
        assert_eq!(done.steps[0].approved_by.len(), 2);
    }

    /// An identity outside the approver set is rejected and the execution's
    /// state does not change.
    #[test]
    fn test_approval_by_outsider_rejected() {
        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner
            .start(
                &block_ip_playbook(),
                params(&[("ip_address", "10.0.0.5")]),
                "john.doe",
            )
            .unwrap();
        let logs_before = snapshot.logs.len();

        let err = runner
            .approve(&snapshot.id, &ApproverId::new("mallory"))
            .unwrap_err();
        assert!(matches!(err, CordonError::NotAnApprover { .. }));

        let after = runner.status(&snapshot.id).unwrap();
        assert_eq!(after.status, ExecutionStatus::AwaitingApproval);
        assert!(after.steps[0].approved_by.is_empty());
        assert_eq!(after.logs.len(), logs_before);
    }

    /// Re-sending an approval from the same identity is accepted, ignored,
    /// and never double-counted.
    #[test]
    fn test_duplicate_approval_is_ignored() {
        let playbook = PlaybookDefinition::new(
            PlaybookId::new("two-approvers"),
            "Two approvers",
            "",
            "t",
            vec![approval("step1", &["admin", "security-lead"])],
        )
        .unwrap();

        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner.start(&playbook, params(&[]), "t").unwrap();
        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();
        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();

        let mid = runner.status(&snapshot.id).unwrap();
        assert_eq!(mid.status, ExecutionStatus::AwaitingApproval);
        assert_eq!(mid.steps[0].approved_by.len(), 1);
    }

    /// Fail-fast: a dispatcher reporting `success: false` fails the run and
    /// later steps never leave Pending.
    #[test]
    fn test_action_failure_fails_fast() {
        let dispatcher = MockDispatcher::failing("firewall API returned 500");
        let notifier = MockNotifier::succeeding();
        let notifier_calls = notifier.calls.clone();
        let recorder = MockRecorder::new();
        let records = recorder.records.clone();

        let runner = Runner::new(
            Box::new(dispatcher),
            Box::new(notifier),
            Box::new(recorder),
        );

        let snapshot = runner
            .start(
                &block_ip_playbook(),
                params(&[("ip_address", "10.0.0.5")]),
                "john.doe",
            )
            .unwrap();
        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();

        let done = runner.status(&snapshot.id).unwrap();
        assert_eq!(done.status, ExecutionStatus::Failed);
        assert_eq!(done.steps[1].status, StepStatus::Failed);
        // The notification step never started.
        assert_eq!(done.steps[2].status, StepStatus::Pending);
        assert!(notifier_calls.lock().unwrap().is_empty());

        // The failure is on the log at error level.
        assert!(done
            .logs
            .iter()
            .any(|e| e.level == LogLevel::Error && e.message.contains("firewall.block_ip")));

        assert_eq!(records.lock().unwrap().len(), 1);
    }

    /// A dispatcher transport error is treated the same as a reported
    /// failure.
    #[test]
    fn test_dispatcher_error_fails_fast() {
        let runner = Runner::new(
            Box::new(ErroringDispatcher),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner
            .start(
                &block_ip_playbook(),
                params(&[("ip_address", "10.0.0.5")]),
                "john.doe",
            )
            .unwrap();
        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();

        let done = runner.status(&snapshot.id).unwrap();
        assert_eq!(done.status, ExecutionStatus::Failed);
        assert_eq!(done.steps[2].status, StepStatus::Pending);
        let result = done.steps[1].result.as_ref().unwrap();
        assert!(!result.success);
        assert!(result.message.contains("connection refused"));
    }

    /// Best-effort: a notification failure is logged as a warning and the
    /// run still completes.
    #[test]
    fn test_notification_failure_does_not_fail_run() {
        let notifier = MockNotifier::failing("slack webhook 404");
        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(notifier),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner
            .start(
                &block_ip_playbook(),
                params(&[("ip_address", "10.0.0.5")]),
                "john.doe",
            )
            .unwrap();
        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();

        let done = runner.status(&snapshot.id).unwrap();
        assert_eq!(done.status, ExecutionStatus::Completed);

        // The step completed, but its result carries the failure.
        assert_eq!(done.steps[2].status, StepStatus::Completed);
        let result = done.steps[2].result.as_ref().unwrap();
        assert!(!result.success);

        assert!(done
            .logs
            .iter()
            .any(|e| e.level == LogLevel::Warning && e.message.contains("slack webhook 404")));
    }

    /// Cancelling a suspended run marks the in-flight step failed with
    /// reason "cancelled" and no further step starts.
    #[test]
    fn test_cancel_while_awaiting_approval() {
        let dispatcher = MockDispatcher::succeeding();
        let dispatcher_calls = dispatcher.calls.clone();
        let runner = Runner::new(
            Box::new(dispatcher),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner
            .start(
                &block_ip_playbook(),
                params(&[("ip_address", "10.0.0.5")]),
                "john.doe",
            )
            .unwrap();

        runner.cancel(&snapshot.id).unwrap();

        let done = runner.status(&snapshot.id).unwrap();
        assert_eq!(done.status, ExecutionStatus::Cancelled);
        assert_eq!(done.steps[0].status, StepStatus::Failed);
        assert_eq!(done.steps[0].result.as_ref().unwrap().message, "cancelled");
        assert_eq!(done.steps[1].status, StepStatus::Pending);
        assert!(dispatcher_calls.lock().unwrap().is_empty());

        // Approval after cancellation is an invalid transition.
        let err = runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap_err();
        assert!(matches!(err, CordonError::InvalidStateTransition { .. }));
    }

    /// Cancelling a terminal execution is rejected and leaves status and
    /// logs byte-for-byte unchanged.
    #[test]
    fn test_cancel_terminal_is_rejected() {
        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner
            .start(
                &block_ip_playbook(),
                params(&[("ip_address", "10.0.0.5")]),
                "john.doe",
            )
            .unwrap();
        runner
            .approve(&snapshot.id, &ApproverId::new("admin"))
            .unwrap();

        let before = runner.status(&snapshot.id).unwrap();
        assert_eq!(before.status, ExecutionStatus::Completed);

        let err = runner.cancel(&snapshot.id).unwrap_err();
        match err {
            CordonError::InvalidStateTransition { operation, status } => {
                assert_eq!(operation, "cancel");
                assert_eq!(status, ExecutionStatus::Completed);
            }
            other => panic!("expected InvalidStateTransition, got {:?}", other),
        }

        let after = runner.status(&snapshot.id).unwrap();
        assert_eq!(after.status, before.status);
        assert_eq!(after.logs, before.logs);
    }

    /// A playbook with no approval steps runs to completion inside `start`.
    #[test]
    fn test_unattended_playbook_completes_in_start() {
        let playbook = PlaybookDefinition::new(
            PlaybookId::new("notify-only"),
            "Notify only",
            "",
            "t",
            vec![step(
                "step1",
                "Notify",
                StepConfig::Notification {
                    channel: "#ops".to_string(),
                    message: "ping".to_string(),
                },
            )],
        )
        .unwrap();

        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner.start(&playbook, params(&[]), "t").unwrap();
        assert_eq!(snapshot.status, ExecutionStatus::Completed);
    }

    /// Operations against an unregistered id fail with UnknownExecution.
    #[test]
    fn test_unknown_execution() {
        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let ghost = ExecutionId::new();
        assert!(matches!(
            runner.status(&ghost).unwrap_err(),
            CordonError::UnknownExecution { .. }
        ));
        assert!(matches!(
            runner.cancel(&ghost).unwrap_err(),
            CordonError::UnknownExecution { .. }
        ));
        assert!(matches!(
            runner.approve(&ghost, &ApproverId::new("admin")).unwrap_err(),
            CordonError::UnknownExecution { .. }
        ));
    }

    /// Snapshots are copies: mutating one never leaks into the runner's
    /// state.
    #[test]
    fn test_status_returns_detached_snapshot() {
        let runner = Runner::new(
            Box::new(MockDispatcher::succeeding()),
            Box::new(MockNotifier::succeeding()),
            Box::new(MockRecorder::new()),
        );

        let snapshot = runner
            .start(
                &block_ip_playbook(),
                params(&[("ip_address", "10.0.0.5")]),
                "john.doe",
            )
            .unwrap();

        let mut copy = runner.status(&snapshot.id).unwrap();
        copy.status = ExecutionStatus::Failed;
        copy.logs.clear();

        let fresh = runner.status(&snapshot.id).unwrap();
        assert_eq!(fresh.status, ExecutionStatus::AwaitingApproval);
        assert!(!fresh.logs.is_empty());
    }
}
