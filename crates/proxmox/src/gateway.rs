//! Gateway trait and mock implementation.
//!
//! [`Gateway`] is the seam between power-control logic and the Proxmox VE
//! API. The real implementation is [`crate::PveClient`]; tests use
//! [`MockGateway`] to script inventories and inject per-VM failures.

use crate::error::{Error, Result};
use crate::types::{NodeStatus, VirtualMachine};
use std::collections::HashSet;
use std::sync::Mutex;

/// Abstraction over the Proxmox VE API surface used for power control.
///
/// Implementations must be safe to call from multiple threads at once:
/// start/stop calls for different VMs are dispatched concurrently.
pub trait Gateway: Send + Sync {
    /// Fetch the Proxmox VE release version string.
    fn version(&self) -> Result<String>;

    /// Fetch status for a node.
    ///
    /// # Errors
    ///
    /// Returns `Error::NodeNotFound` if the node name is unknown.
    fn node_status(&self, node: &str) -> Result<NodeStatus>;

    /// List the QEMU virtual machines on a node.
    ///
    /// Order is whatever the API returns; callers that need determinism
    /// should sort with [`crate::sort_vms`].
    fn list_vms(&self, node: &str) -> Result<Vec<VirtualMachine>>;

    /// Start a virtual machine.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the API rejects the start request.
    fn start_vm(&self, node: &str, vmid: u64) -> Result<()>;

    /// Stop a virtual machine.
    ///
    /// # Errors
    ///
    /// Returns `Error::Api` if the API rejects the stop request.
    fn stop_vm(&self, node: &str, vmid: u64) -> Result<()>;
}

/// Mock gateway for testing without a live cluster.
///
/// Holds a scripted inventory, records every start/stop call, and can be
/// told to fail specific VM ids.
#[derive(Debug, Default)]
pub struct MockGateway {
    node: String,
    vms: Mutex<Vec<VirtualMachine>>,
    failing: HashSet<u64>,
    started: Mutex<Vec<u64>>,
    stopped: Mutex<Vec<u64>>,
}

impl MockGateway {
    /// Create a mock gateway for one node with the given inventory.
    #[must_use]
    pub fn new(node: impl Into<String>, vms: Vec<VirtualMachine>) -> Self {
        Self {
            node: node.into(),
            vms: Mutex::new(vms),
            ..Self::default()
        }
    }

    /// Make start/stop calls for the given VM id fail.
    pub fn fail_vm(&mut self, vmid: u64) {
        self.failing.insert(vmid);
    }

    /// VM ids that received a start call, in dispatch-completion order.
    #[must_use]
    pub fn started(&self) -> Vec<u64> {
        self.started.lock().unwrap().clone()
    }

    /// VM ids that received a stop call, in dispatch-completion order.
    #[must_use]
    pub fn stopped(&self) -> Vec<u64> {
        self.stopped.lock().unwrap().clone()
    }

    fn check_node(&self, node: &str) -> Result<()> {
        if node == self.node {
            Ok(())
        } else {
            Err(Error::NodeNotFound(node.to_string()))
        }
    }
}

impl Gateway for MockGateway {
    fn version(&self) -> Result<String> {
        Ok("8.2.4".to_string())
    }

    fn node_status(&self, node: &str) -> Result<NodeStatus> {
        self.check_node(node)?;
        Ok(NodeStatus { uptime: 3600 })
    }

    fn list_vms(&self, node: &str) -> Result<Vec<VirtualMachine>> {
        self.check_node(node)?;
        Ok(self.vms.lock().unwrap().clone())
    }

    fn start_vm(&self, node: &str, vmid: u64) -> Result<()> {
        self.check_node(node)?;
        self.started.lock().unwrap().push(vmid);
        if self.failing.contains(&vmid) {
            return Err(Error::api("start", vmid, "mock failure"));
        }
        Ok(())
    }

    fn stop_vm(&self, node: &str, vmid: u64) -> Result<()> {
        self.check_node(node)?;
        self.stopped.lock().unwrap().push(vmid);
        if self.failing.contains(&vmid) {
            return Err(Error::api("stop", vmid, "mock failure"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VmStatus;

    fn inventory() -> Vec<VirtualMachine> {
        vec![
            VirtualMachine {
                vmid: 100,
                name: "db1".to_string(),
                status: VmStatus::Running,
            },
            VirtualMachine {
                vmid: 101,
                name: "web1".to_string(),
                status: VmStatus::Stopped,
            },
        ]
    }

    #[test]
    fn test_mock_lists_scripted_inventory() {
        let mock = MockGateway::new("pve", inventory());
        let vms = mock.list_vms("pve").unwrap();
        assert_eq!(vms.len(), 2);
    }

    #[test]
    fn test_mock_unknown_node() {
        let mock = MockGateway::new("pve", inventory());
        assert!(matches!(
            mock.list_vms("nope"),
            Err(Error::NodeNotFound(_))
        ));
        assert!(matches!(
            mock.node_status("nope"),
            Err(Error::NodeNotFound(_))
        ));
    }

    #[test]
    fn test_mock_records_calls() {
        let mock = MockGateway::new("pve", inventory());
        mock.start_vm("pve", 101).unwrap();
        mock.stop_vm("pve", 100).unwrap();
        assert_eq!(mock.started(), vec![101]);
        assert_eq!(mock.stopped(), vec![100]);
    }

    #[test]
    fn test_mock_injected_failure() {
        let mut mock = MockGateway::new("pve", inventory());
        mock.fail_vm(101);
        let err = mock.start_vm("pve", 101).unwrap_err();
        assert!(matches!(err, Error::Api { vmid: 101, .. }));
        // The call is still recorded even though it failed
        assert_eq!(mock.started(), vec![101]);
    }
}
