//! Reconciliation planner - partitions targets by compliance

use crate::target::BoxedTarget;
use crate::types::ComplianceStatus;

/// A plan with targets split by compliance, in input order
#[derive(Debug, Default)]
pub struct Plan {
    /// Targets already in the desired state
    pub compliant: Vec<BoxedTarget>,
    /// Targets that need a mutation
    pub pending: Vec<BoxedTarget>,
}

impl Plan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an inspected target to the matching side
    pub fn add(&mut self, target: BoxedTarget, status: ComplianceStatus) {
        match status {
            ComplianceStatus::Compliant => self.compliant.push(target),
            ComplianceStatus::NeedsMutation => self.pending.push(target),
        }
    }

    /// Total number of targets in the plan
    pub fn total(&self) -> usize {
        self.compliant.len() + self.pending.len()
    }

    /// Check if nothing needs to change
    pub fn is_noop(&self) -> bool {
        self.pending.is_empty()
    }

    /// Ids of pending targets, in execution order
    pub fn pending_ids(&self) -> Vec<String> {
        self.pending.iter().map(|t| t.id()).collect()
    }
}

/// Inspect every target and partition the set
///
/// Inspection failures are logged and classified as needing mutation.
pub fn plan(targets: Vec<BoxedTarget>) -> Plan {
    let mut plan = Plan::new();

    for target in targets {
        let inspection = target.is_compliant();
        if let Err(e) = &inspection {
            log::warn!("Could not inspect {}: {e:#}", target.id());
        }
        let status = ComplianceStatus::from_inspection(&inspection);
        log::debug!("{} [{}]: {:?}", target.id(), target.kind(), status);
        plan.add(target, status);
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Target;
    use crate::types::ApplyError;
    use std::collections::HashSet;

    #[derive(Debug)]
    struct Fixed {
        id: &'static str,
        compliant: Result<bool, &'static str>,
    }

    impl Target for Fixed {
        fn id(&self) -> String {
            self.id.to_string()
        }

        fn description(&self) -> String {
            format!("fixed {}", self.id)
        }

        fn kind(&self) -> &'static str {
            "fixed"
        }

        fn is_compliant(&self) -> anyhow::Result<bool> {
            self.compliant.map_err(|e| anyhow::anyhow!(e))
        }

        fn apply(&self) -> Result<(), ApplyError> {
            Ok(())
        }
    }

    fn targets() -> Vec<BoxedTarget> {
        vec![
            Box::new(Fixed { id: "a", compliant: Ok(true) }),
            Box::new(Fixed { id: "b", compliant: Ok(false) }),
            Box::new(Fixed { id: "c", compliant: Err("HTTP 502") }),
            Box::new(Fixed { id: "d", compliant: Ok(true) }),
            Box::new(Fixed { id: "e", compliant: Ok(false) }),
        ]
    }

    #[test]
    fn test_partition_is_total_and_disjoint() {
        let all: HashSet<String> = targets().iter().map(|t| t.id()).collect();
        let plan = plan(targets());

        let compliant: HashSet<String> = plan.compliant.iter().map(|t| t.id()).collect();
        let pending: HashSet<String> = plan.pending.iter().map(|t| t.id()).collect();

        assert!(compliant.is_disjoint(&pending));
        assert_eq!(&compliant | &pending, all);
        assert_eq!(plan.total(), all.len());
    }

    #[test]
    fn test_inspection_error_is_pending() {
        let plan = plan(targets());
        assert!(plan.pending_ids().contains(&"c".to_string()));
    }

    #[test]
    fn test_pending_keeps_enumeration_order() {
        let plan = plan(targets());
        assert_eq!(plan.pending_ids(), vec!["b", "c", "e"]);
    }

    #[test]
    fn test_all_compliant_is_noop() {
        let plan = plan(vec![
            Box::new(Fixed { id: "a", compliant: Ok(true) }),
            Box::new(Fixed { id: "b", compliant: Ok(true) }),
        ]);
        assert!(plan.is_noop());
        assert_eq!(plan.compliant.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let plan = plan(Vec::new());
        assert!(plan.is_noop());
        assert_eq!(plan.total(), 0);
    }
}
