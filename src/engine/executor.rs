//! Reconciliation passes - applies start/stop decisions with parallelism
//!
//! A pass is one concurrent batch of identical operations (all starts or
//! all stops). Failures are isolated: every eligible VM gets exactly one
//! attempt, and one VM failing never cancels or blocks its siblings.

use crate::ui;
use log::debug;
use proxmox::{Error, Gateway, VirtualMachine};
use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// The operation a pass applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Power a VM on.
    Start,
    /// Power a VM off.
    Stop,
}

impl Action {
    /// Lowercase verb for log lines ("start" / "stop").
    pub fn verb(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
        }
    }

    /// Whether a VM in the given state needs this action at all.
    ///
    /// The start gate is "not running": a VM in a transitional state is
    /// still start-eligible, matching a literal `status != running` check.
    /// The stop gate is "running", so transitional states are never
    /// stopped — no conflicting commands during ambiguous states.
    fn eligible(self, vm: &VirtualMachine) -> bool {
        match self {
            Self::Start => !vm.is_running(),
            Self::Stop => vm.is_running(),
        }
    }

    fn announce(self, name: &str) {
        match self {
            Self::Start => ui::info(&format!("Starting {}...", name)),
            Self::Stop => ui::info(&format!("Stopping {}...", name)),
        }
    }
}

/// Result of one attempted operation on one VM.
#[derive(Debug)]
pub struct Outcome {
    /// VM name.
    pub name: String,
    /// VM id the call targeted.
    pub vmid: u64,
    /// Operation that was attempted.
    pub action: Action,
    /// Success, or the error the gateway returned.
    pub result: Result<(), Error>,
}

impl Outcome {
    /// Whether the operation succeeded.
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Counts across one or more completed passes.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassSummary {
    /// Operations dispatched.
    pub attempted: usize,
    /// Operations that completed successfully.
    pub succeeded: usize,
    /// Operations the gateway rejected or that failed in transit.
    pub failed: usize,
}

impl PassSummary {
    /// Fold a batch of outcomes into the summary.
    pub fn add_outcomes(&mut self, outcomes: &[Outcome]) {
        for outcome in outcomes {
            self.attempted += 1;
            if outcome.succeeded() {
                self.succeeded += 1;
            } else {
                self.failed += 1;
            }
        }
    }

    /// Whether any attempted operation failed.
    pub fn has_failures(&self) -> bool {
        self.failed > 0
    }
}

/// Run one pass: apply `action` to every named VM that needs it.
///
/// Names without a matching inventory entry are skipped silently, as are
/// VMs already in the desired state — running the same selection twice
/// attempts nothing the second time. When no operation is eligible the
/// pass says so explicitly instead of staying quiet.
///
/// Eligible operations are dispatched concurrently (at most `jobs`
/// threads; `0` means one thread per operation) and the pass waits for
/// all of them. Outcome order is completion order, not submission order.
pub fn run_pass(
    gateway: &dyn Gateway,
    node: &str,
    vms: &[VirtualMachine],
    names: &[String],
    action: Action,
    jobs: usize,
) -> Vec<Outcome> {
    let by_name: HashMap<&str, &VirtualMachine> =
        vms.iter().map(|vm| (vm.name.as_str(), vm)).collect();

    let candidates: Vec<&VirtualMachine> = names
        .iter()
        .filter_map(|name| by_name.get(name.as_str()).copied())
        .filter(|vm| action.eligible(vm))
        .collect();

    if candidates.is_empty() {
        ui::dim(&format!("No virtual machines to {}", action.verb()));
        return Vec::new();
    }

    for vm in &candidates {
        action.announce(&vm.name);
    }

    debug!(
        "dispatching {} {} operation(s) on node {}",
        candidates.len(),
        action.verb(),
        node
    );

    if candidates.len() == 1 || jobs == 1 {
        candidates
            .into_iter()
            .map(|vm| apply(gateway, node, vm, action))
            .collect()
    } else {
        run_parallel(gateway, node, &candidates, action, jobs)
    }
}

/// Dispatch operations on a bounded thread pool, collecting outcomes as
/// they complete.
fn run_parallel(
    gateway: &dyn Gateway,
    node: &str,
    candidates: &[&VirtualMachine],
    action: Action,
    jobs: usize,
) -> Vec<Outcome> {
    let threads = if jobs == 0 {
        candidates.len()
    } else {
        jobs.min(candidates.len())
    };

    let outcomes: Arc<Mutex<Vec<Outcome>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
        Ok(pool) => pool,
        Err(e) => {
            debug!("thread pool unavailable ({}), running sequentially", e);
            return candidates
                .iter()
                .map(|vm| apply(gateway, node, vm, action))
                .collect();
        }
    };

    pool.install(|| {
        candidates.par_iter().for_each(|vm| {
            let outcome = apply(gateway, node, vm, action);
            outcomes.lock().unwrap().push(outcome);
        });
    });

    Arc::try_unwrap(outcomes)
        .expect("all workers joined")
        .into_inner()
        .unwrap()
}

/// One attempt against the gateway. Errors are captured in the outcome,
/// never propagated, so sibling operations are unaffected.
fn apply(gateway: &dyn Gateway, node: &str, vm: &VirtualMachine, action: Action) -> Outcome {
    let result = match action {
        Action::Start => gateway.start_vm(node, vm.vmid),
        Action::Stop => gateway.stop_vm(node, vm.vmid),
    };

    Outcome {
        name: vm.name.clone(),
        vmid: vm.vmid,
        action,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::differ::{inventory_names, power_off_set};
    use proxmox::VmStatus;
    use proxmox::gateway::MockGateway;

    fn vm(vmid: u64, name: &str, status: VmStatus) -> VirtualMachine {
        VirtualMachine {
            vmid,
            name: name.to_string(),
            status,
        }
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_start_skips_running() {
        // db1 already running, so only db2 and web1 get start calls
        let vms = vec![
            vm(100, "db1", VmStatus::Running),
            vm(101, "db2", VmStatus::Stopped),
            vm(102, "web1", VmStatus::Stopped),
        ];
        let mock = MockGateway::new("pve", vms.clone());

        let outcomes = run_pass(&mock, "pve", &vms, &names(&["db2", "web1"]), Action::Start, 0);

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(Outcome::succeeded));
        let mut started = mock.started();
        started.sort_unstable();
        assert_eq!(started, vec![101, 102]);
    }

    #[test]
    fn test_stop_pass_targets_complement() {
        let vms = vec![
            vm(100, "db1", VmStatus::Running),
            vm(101, "db2", VmStatus::Stopped),
            vm(102, "web1", VmStatus::Stopped),
        ];
        let mock = MockGateway::new("pve", vms.clone());

        let all = inventory_names(&vms);
        let off = power_off_set(&all, &names(&["db2", "web1"]));
        assert_eq!(off, names(&["db1"]));

        let outcomes = run_pass(&mock, "pve", &vms, &off, Action::Stop, 0);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(mock.stopped(), vec![100]);
    }

    #[test]
    fn test_stop_skips_already_stopped() {
        let vms = vec![vm(100, "db1", VmStatus::Stopped)];
        let mock = MockGateway::new("pve", vms.clone());

        let outcomes = run_pass(&mock, "pve", &vms, &names(&["db1"]), Action::Stop, 0);
        assert!(outcomes.is_empty());
        assert!(mock.stopped().is_empty());
    }

    #[test]
    fn test_second_run_attempts_nothing() {
        // A converged node: selection matches reality exactly
        let vms = vec![vm(100, "a", VmStatus::Running)];
        let mock = MockGateway::new("pve", vms.clone());

        let start = run_pass(&mock, "pve", &vms, &names(&["a"]), Action::Start, 0);
        let stop = run_pass(&mock, "pve", &vms, &[], Action::Stop, 0);

        assert!(start.is_empty());
        assert!(stop.is_empty());
        assert!(mock.started().is_empty());
        assert!(mock.stopped().is_empty());
    }

    #[test]
    fn test_unknown_name_skipped_silently() {
        let vms = vec![vm(100, "a", VmStatus::Stopped)];
        let mock = MockGateway::new("pve", vms.clone());

        let outcomes = run_pass(&mock, "pve", &vms, &names(&["ghost", "a"]), Action::Start, 0);
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].name, "a");
    }

    #[test]
    fn test_failure_isolation() {
        let vms = vec![
            vm(100, "a", VmStatus::Stopped),
            vm(101, "b", VmStatus::Stopped),
        ];
        let mut mock = MockGateway::new("pve", vms.clone());
        mock.fail_vm(100);

        let outcomes = run_pass(&mock, "pve", &vms, &names(&["a", "b"]), Action::Start, 0);

        assert_eq!(outcomes.len(), 2);
        let a = outcomes.iter().find(|o| o.name == "a").unwrap();
        let b = outcomes.iter().find(|o| o.name == "b").unwrap();
        assert!(!a.succeeded());
        assert!(b.succeeded());
        // Both calls were dispatched despite a's failure
        let mut started = mock.started();
        started.sort_unstable();
        assert_eq!(started, vec![100, 101]);
    }

    #[test]
    fn test_transitional_status_start_eligible_stop_ineligible() {
        let vms = vec![vm(100, "a", VmStatus::Other("paused".to_string()))];
        let mock = MockGateway::new("pve", vms.clone());

        // Not literally running, so the start gate lets it through
        let start = run_pass(&mock, "pve", &vms, &names(&["a"]), Action::Start, 0);
        assert_eq!(start.len(), 1);

        // But it is never stop-eligible
        let stop = run_pass(&mock, "pve", &vms, &names(&["a"]), Action::Stop, 0);
        assert!(stop.is_empty());
    }

    #[test]
    fn test_empty_inventory_reports_nothing_to_do() {
        let mock = MockGateway::new("pve", Vec::new());
        let start = run_pass(&mock, "pve", &[], &[], Action::Start, 0);
        let stop = run_pass(&mock, "pve", &[], &[], Action::Stop, 0);
        assert!(start.is_empty());
        assert!(stop.is_empty());
    }

    #[test]
    fn test_jobs_cap_still_covers_all_vms() {
        let vms: Vec<VirtualMachine> = (0..8)
            .map(|i| vm(100 + i, &format!("vm{}", i), VmStatus::Stopped))
            .collect();
        let mock = MockGateway::new("pve", vms.clone());
        let all = inventory_names(&vms);

        let outcomes = run_pass(&mock, "pve", &vms, &all, Action::Start, 2);
        assert_eq!(outcomes.len(), 8);
        assert_eq!(mock.started().len(), 8);
    }

    #[test]
    fn test_summary_counts() {
        let vms = vec![
            vm(100, "a", VmStatus::Stopped),
            vm(101, "b", VmStatus::Stopped),
        ];
        let mut mock = MockGateway::new("pve", vms.clone());
        mock.fail_vm(101);

        let outcomes = run_pass(&mock, "pve", &vms, &names(&["a", "b"]), Action::Start, 0);
        let mut summary = PassSummary::default();
        summary.add_outcomes(&outcomes);

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.has_failures());
    }
}
