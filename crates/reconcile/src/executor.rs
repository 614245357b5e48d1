//! Execution engine - applies pending targets one at a time

use crate::context::{ConfirmCallback, Pacer, ProgressCallback};
use crate::planner::{Plan, plan};
use crate::target::{BoxedTarget, Target};
use crate::types::{MutationOutcome, RunReport, RunSummary};
use anyhow::Result;

/// Apply every pending target, strictly in order
///
/// A failure is recorded against its target and the batch moves on. The
/// pacer runs after every attempt, whatever the outcome.
pub fn apply<P, D>(
    pending: &[BoxedTarget],
    progress: &mut P,
    pacer: &mut D,
) -> Vec<(String, MutationOutcome)>
where
    P: ProgressCallback,
    D: Pacer,
{
    let total = pending.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, target) in pending.iter().enumerate() {
        progress.on_start(index + 1, total, target.as_ref());
        let outcome = apply_target(target.as_ref());
        progress.on_complete(&target.id(), &outcome);
        outcomes.push((target.id(), outcome));
        pacer.pause();
    }

    outcomes
}

/// Apply a single target and classify the result
fn apply_target(target: &dyn Target) -> MutationOutcome {
    let outcome = MutationOutcome::classify(target.apply());
    // Outcomes are already shown inline by the progress callback
    log::info!("{} [{}]: {outcome}", target.id(), target.kind());
    outcome
}

/// Plan, confirm, apply and summarize
///
/// # Arguments
/// * `targets` - Targets in enumeration order
/// * `confirm` - Gate consulted only when something is pending
/// * `progress` - Progress callback for the mutation phase
/// * `pacer` - Delay applied after every mutation call
pub fn run<C, P, D>(
    targets: Vec<BoxedTarget>,
    confirm: &mut C,
    progress: &mut P,
    pacer: &mut D,
) -> Result<RunReport>
where
    C: ConfirmCallback,
    P: ProgressCallback,
    D: Pacer,
{
    let plan = plan(targets);
    execute(&plan, confirm, progress, pacer)
}

/// Confirm and apply an already computed plan
pub fn execute<C, P, D>(
    plan: &Plan,
    confirm: &mut C,
    progress: &mut P,
    pacer: &mut D,
) -> Result<RunReport>
where
    C: ConfirmCallback,
    P: ProgressCallback,
    D: Pacer,
{
    let compliant = plan.compliant.len();

    if plan.is_noop() {
        return Ok(RunReport::NothingToDo { compliant });
    }

    if !confirm.confirm(plan)? {
        return Ok(RunReport::Declined {
            compliant,
            pending: plan.pending.len(),
        });
    }

    let outcomes = apply(&plan.pending, progress, pacer);
    let summary = RunSummary::from_outcomes(compliant, &outcomes);

    Ok(RunReport::Applied { summary, outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoDelay, NoProgress};
    use crate::types::ApplyError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Shared fake remote: a set of configured ids plus a call log
    #[derive(Debug, Default)]
    struct FakeRemote {
        configured: Mutex<HashSet<String>>,
        mutations: AtomicUsize,
        order: Mutex<Vec<String>>,
    }

    #[derive(Debug)]
    struct FakeTarget {
        id: String,
        remote: Arc<FakeRemote>,
        failure: Option<ApplyError>,
    }

    impl FakeTarget {
        fn boxed(id: &str, remote: &Arc<FakeRemote>) -> BoxedTarget {
            Box::new(Self {
                id: id.to_string(),
                remote: Arc::clone(remote),
                failure: None,
            })
        }

        fn failing(id: &str, remote: &Arc<FakeRemote>, failure: ApplyError) -> BoxedTarget {
            Box::new(Self {
                id: id.to_string(),
                remote: Arc::clone(remote),
                failure: Some(failure),
            })
        }
    }

    impl Target for FakeTarget {
        fn id(&self) -> String {
            self.id.clone()
        }

        fn description(&self) -> String {
            format!("Configure {}", self.id)
        }

        fn kind(&self) -> &'static str {
            "fake"
        }

        fn is_compliant(&self) -> anyhow::Result<bool> {
            Ok(self.remote.configured.lock().unwrap().contains(&self.id))
        }

        fn apply(&self) -> Result<(), ApplyError> {
            self.remote.mutations.fetch_add(1, Ordering::SeqCst);
            self.remote.order.lock().unwrap().push(self.id.clone());
            if let Some(failure) = &self.failure {
                return Err(failure.clone());
            }
            self.remote.configured.lock().unwrap().insert(self.id.clone());
            Ok(())
        }
    }

    struct CountingPacer(usize);

    impl Pacer for CountingPacer {
        fn pause(&mut self) {
            self.0 += 1;
        }
    }

    struct CountingGate(usize);

    impl ConfirmCallback for CountingGate {
        fn confirm(&mut self, _plan: &Plan) -> Result<bool> {
            self.0 += 1;
            Ok(true)
        }
    }

    fn targets(remote: &Arc<FakeRemote>, ids: &[&str]) -> Vec<BoxedTarget> {
        ids.iter().map(|id| FakeTarget::boxed(id, remote)).collect()
    }

    #[test]
    fn test_partial_failure_isolation() {
        let remote = Arc::new(FakeRemote::default());
        let targets = vec![
            FakeTarget::boxed("A", &remote),
            FakeTarget::failing("B", &remote, ApplyError::rejected("Validation Failed (HTTP 422)")),
            FakeTarget::boxed("C", &remote),
        ];

        let report = run(targets, &mut AutoConfirm, &mut NoProgress, &mut NoDelay).unwrap();

        let RunReport::Applied { summary, outcomes } = report else {
            panic!("expected mutations");
        };
        assert_eq!(outcomes[0], ("A".into(), MutationOutcome::Created));
        assert!(matches!(outcomes[1], (ref id, MutationOutcome::Failed { .. }) if id == "B"));
        assert_eq!(outcomes[2], ("C".into(), MutationOutcome::Created));
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.created, 2);
    }

    #[test]
    fn test_conflict_counts_as_already_exists() {
        let remote = Arc::new(FakeRemote::default());
        let targets = vec![FakeTarget::failing(
            "repo",
            &remote,
            ApplyError::conflict("Hook already exists on this repository"),
        )];

        let report = run(targets, &mut AutoConfirm, &mut NoProgress, &mut NoDelay).unwrap();

        let RunReport::Applied { summary, .. } = report else {
            panic!("expected mutations");
        };
        assert_eq!(summary.already_exists, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.now_compliant(), 1);
    }

    #[test]
    fn test_no_mutation_on_decline() {
        let remote = Arc::new(FakeRemote::default());
        let report = run(
            targets(&remote, &["a", "b"]),
            &mut AutoDecline,
            &mut NoProgress,
            &mut NoDelay,
        )
        .unwrap();

        assert_eq!(report, RunReport::Declined { compliant: 0, pending: 2 });
        assert_eq!(remote.mutations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_empty_plan_skips_gate_and_mutations() {
        let remote = Arc::new(FakeRemote::default());
        remote.configured.lock().unwrap().extend(["a".to_string(), "b".to_string()]);

        let mut gate = CountingGate(0);
        let report = run(
            targets(&remote, &["a", "b"]),
            &mut gate,
            &mut NoProgress,
            &mut NoDelay,
        )
        .unwrap();

        assert_eq!(report, RunReport::NothingToDo { compliant: 2 });
        assert_eq!(gate.0, 0);
        assert_eq!(remote.mutations.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_idempotent_rerun() {
        let remote = Arc::new(FakeRemote::default());
        remote.configured.lock().unwrap().insert("b".to_string());

        let first = run(
            targets(&remote, &["a", "b", "c"]),
            &mut AutoConfirm,
            &mut NoProgress,
            &mut NoDelay,
        )
        .unwrap();
        assert!(first.mutated());

        let second = run(
            targets(&remote, &["a", "b", "c"]),
            &mut AutoConfirm,
            &mut NoProgress,
            &mut NoDelay,
        )
        .unwrap();
        assert_eq!(second, RunReport::NothingToDo { compliant: 3 });
        assert_eq!(remote.mutations.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_sequential_order_and_unconditional_delay() {
        let remote = Arc::new(FakeRemote::default());
        let pending = vec![
            FakeTarget::boxed("one", &remote),
            FakeTarget::failing("two", &remote, ApplyError::rejected("boom")),
            FakeTarget::failing("three", &remote, ApplyError::conflict("exists")),
            FakeTarget::boxed("four", &remote),
        ];

        let mut pacer = CountingPacer(0);
        let outcomes = apply(&pending, &mut NoProgress, &mut pacer);

        assert_eq!(pacer.0, 4);
        assert_eq!(outcomes.len(), 4);
        assert_eq!(
            *remote.order.lock().unwrap(),
            vec!["one", "two", "three", "four"]
        );
    }

    #[test]
    fn test_aggregation_identity_holds() {
        let remote = Arc::new(FakeRemote::default());
        remote.configured.lock().unwrap().insert("x".to_string());
        let targets = vec![
            FakeTarget::boxed("x", &remote),
            FakeTarget::boxed("a", &remote),
            FakeTarget::failing("b", &remote, ApplyError::rejected("no")),
            FakeTarget::failing("c", &remote, ApplyError::conflict("exists")),
        ];

        let report = run(targets, &mut AutoConfirm, &mut NoProgress, &mut NoDelay).unwrap();
        let RunReport::Applied { summary, outcomes } = report else {
            panic!("expected mutations");
        };

        assert_eq!(summary.attempted(), outcomes.len());
        assert_eq!(outcomes.len(), 3);
        assert_eq!(summary.total(), 4);
        assert!(outcomes.iter().all(|(id, _)| id != "x"));
    }

    #[test]
    fn test_progress_receives_every_target() {
        struct Recorder(Vec<(usize, usize, String)>, usize);

        impl ProgressCallback for Recorder {
            fn on_start(&mut self, index: usize, total: usize, target: &dyn Target) {
                self.0.push((index, total, target.id()));
            }

            fn on_complete(&mut self, _id: &str, _outcome: &MutationOutcome) {
                self.1 += 1;
            }
        }

        let remote = Arc::new(FakeRemote::default());
        let mut recorder = Recorder(Vec::new(), 0);
        apply(&targets(&remote, &["a", "b"]), &mut recorder, &mut NoDelay);

        assert_eq!(recorder.0, vec![(1, 2, "a".to_string()), (2, 2, "b".to_string())]);
        assert_eq!(recorder.1, 2);
    }
}
