//! The interactive reconcile flow: list, select, start/stop, report.

use anyhow::{Context, Result, bail};
use colored::Colorize;
use log::warn;
use proxmox::{Credentials, Gateway, PveClient, VirtualMachine, sort_vms};

use crate::cli::PowerArgs;
use crate::config::Config;
use crate::engine::{Action, Outcome, PassSummary, inventory_names, power_off_set, run_pass};
use crate::ui;

pub fn run(config: &Config, args: &PowerArgs) -> Result<()> {
    let node = args.node.as_deref().unwrap_or(&config.node);

    let client = PveClient::connect(
        &config.host,
        &Credentials::new(&config.username, &config.password),
    )
    .with_context(|| format!("Could not authenticate against {}", config.host))?;

    // Version failure is cosmetic, everything else below is fatal
    match client.version() {
        Ok(version) => ui::kv("Proxmox VE Version", &version),
        Err(e) => warn!("cannot obtain Proxmox VE version: {}", e),
    }

    client
        .node_status(node)
        .with_context(|| format!("Node `{}` does not exist on {}", node, config.host))?;

    let mut vms = client.list_vms(node).context("Could not list VMs")?;
    sort_vms(&mut vms);

    let Some(power_on) = ui::select_power_on(&vms)? else {
        bail!("Selection cancelled, no changes made");
    };

    let power_off = power_off_set(&inventory_names(&vms), &power_on);

    let summary = reconcile(&client, node, &vms, &power_on, &power_off, args.jobs);

    if summary.has_failures() {
        bail!(
            "{} of {} operations failed",
            summary.failed,
            summary.attempted
        );
    }

    if summary.attempted > 0 {
        ui::success(&format!(
            "{} operation(s) completed",
            summary.attempted.to_string().bold()
        ));
    }

    Ok(())
}

/// Run the start pass then the stop pass. The two sets are disjoint by
/// construction, so the passes never touch the same VM.
pub fn reconcile(
    gateway: &dyn Gateway,
    node: &str,
    vms: &[VirtualMachine],
    power_on: &[String],
    power_off: &[String],
    jobs: usize,
) -> PassSummary {
    let mut summary = PassSummary::default();

    let started = run_pass(gateway, node, vms, power_on, Action::Start, jobs);
    report_failures(&started);
    summary.add_outcomes(&started);

    let stopped = run_pass(gateway, node, vms, power_off, Action::Stop, jobs);
    report_failures(&stopped);
    summary.add_outcomes(&stopped);

    summary
}

fn report_failures(outcomes: &[Outcome]) {
    for outcome in outcomes {
        if let Err(e) = &outcome.result {
            ui::error(&format!(
                "Could not {} {}: {}",
                outcome.action.verb(),
                outcome.name,
                e
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
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
    fn test_reconcile_both_passes() {
        let vms = vec![
            vm(100, "db1", VmStatus::Running),
            vm(101, "db2", VmStatus::Stopped),
            vm(102, "web1", VmStatus::Stopped),
        ];
        let mock = MockGateway::new("pve", vms.clone());

        let power_on = names(&["db2", "web1"]);
        let power_off = power_off_set(&inventory_names(&vms), &power_on);
        let summary = reconcile(&mock, "pve", &vms, &power_on, &power_off, 0);

        assert_eq!(summary.attempted, 3);
        assert_eq!(summary.succeeded, 3);
        assert!(!summary.has_failures());
        assert_eq!(mock.stopped(), vec![100]);
    }

    #[test]
    fn test_reconcile_idempotent() {
        let vms = vec![
            vm(100, "db1", VmStatus::Running),
            vm(101, "db2", VmStatus::Stopped),
        ];
        let mock = MockGateway::new("pve", vms.clone());

        // Selection that matches current state exactly
        let power_on = names(&["db1"]);
        let power_off = power_off_set(&inventory_names(&vms), &power_on);
        let summary = reconcile(&mock, "pve", &vms, &power_on, &power_off, 0);

        assert_eq!(summary.attempted, 0);
        assert!(mock.started().is_empty());
        assert!(mock.stopped().is_empty());
    }

    #[test]
    fn test_reconcile_surfaces_failures_in_summary() {
        let vms = vec![
            vm(100, "a", VmStatus::Stopped),
            vm(101, "b", VmStatus::Running),
        ];
        let mut mock = MockGateway::new("pve", vms.clone());
        mock.fail_vm(101);

        let power_on = names(&["a"]);
        let power_off = power_off_set(&inventory_names(&vms), &power_on);
        let summary = reconcile(&mock, "pve", &vms, &power_on, &power_off, 0);

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.succeeded, 1);
        assert_eq!(summary.failed, 1);
        assert!(summary.has_failures());
    }
}
