//! Core types for the Proxmox API client.
//!
//! Wire structs are deserialized from the `data` envelope the Proxmox VE
//! API wraps every response in, then converted into the crate-level types
//! exposed here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a virtual machine.
///
/// Proxmox reports more states than a power-control tool cares about
/// (paused, suspended, internal transitions). Anything other than the two
/// terminal states is preserved verbatim in [`VmStatus::Other`] so callers
/// can display it, but eligibility checks only ever compare against
/// [`VmStatus::Running`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VmStatus {
    /// The VM is up.
    Running,
    /// The VM is shut down.
    Stopped,
    /// Any other state the API reports (transitional or unknown).
    Other(String),
}

impl VmStatus {
    /// Whether the VM is in the `running` terminal state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    /// The raw status string as the API reports it.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for VmStatus {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "running" => Self::Running,
            "stopped" => Self::Stopped,
            _ => Self::Other(raw),
        }
    }
}

impl From<VmStatus> for String {
    fn from(status: VmStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for VmStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A virtual machine as listed under `/nodes/{node}/qemu`.
///
/// The API returns many more fields (cpu, memory, disk counters); only the
/// ones power control needs are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualMachine {
    /// Numeric VM identifier, unique per cluster.
    pub vmid: u64,
    /// VM name, unique per node.
    pub name: String,
    /// Current lifecycle status.
    pub status: VmStatus,
}

impl VirtualMachine {
    /// Whether this VM is currently running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }
}

/// Status summary of a node, from `/nodes/{node}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct NodeStatus {
    /// Seconds since the node booted.
    #[serde(default)]
    pub uptime: u64,
}

/// Sort an inventory in place by VM name, ascending.
///
/// The order is lexicographic and case-sensitive (byte order). Names are
/// unique per node, so the resulting order is total and reproducible
/// across runs.
pub fn sort_vms(vms: &mut [VirtualMachine]) {
    vms.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vm(name: &str, status: &str) -> VirtualMachine {
        VirtualMachine {
            vmid: 100,
            name: name.to_string(),
            status: VmStatus::from(status.to_string()),
        }
    }

    #[test]
    fn test_status_from_wire() {
        assert_eq!(VmStatus::from("running".to_string()), VmStatus::Running);
        assert_eq!(VmStatus::from("stopped".to_string()), VmStatus::Stopped);
        assert_eq!(
            VmStatus::from("paused".to_string()),
            VmStatus::Other("paused".to_string())
        );
    }

    #[test]
    fn test_status_is_running() {
        assert!(VmStatus::Running.is_running());
        assert!(!VmStatus::Stopped.is_running());
        assert!(!VmStatus::Other("paused".to_string()).is_running());
    }

    #[test]
    fn test_status_display_preserves_raw() {
        let status = VmStatus::Other("suspended".to_string());
        assert_eq!(status.to_string(), "suspended");
    }

    #[test]
    fn test_deserialize_vm() {
        let json = r#"{"vmid": 101, "name": "web1", "status": "running"}"#;
        let vm: VirtualMachine = serde_json::from_str(json).unwrap();
        assert_eq!(vm.vmid, 101);
        assert_eq!(vm.name, "web1");
        assert!(vm.is_running());
    }

    #[test]
    fn test_deserialize_unknown_status() {
        let json = r#"{"vmid": 102, "name": "db1", "status": "prelaunch"}"#;
        let vm: VirtualMachine = serde_json::from_str(json).unwrap();
        assert_eq!(vm.status, VmStatus::Other("prelaunch".to_string()));
        assert!(!vm.is_running());
    }

    #[test]
    fn test_sort_vms_by_name() {
        let mut vms = vec![vm("web1", "running"), vm("db2", "stopped"), vm("db1", "running")];
        sort_vms(&mut vms);
        let names: Vec<&str> = vms.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["db1", "db2", "web1"]);
    }

    #[test]
    fn test_sort_vms_case_sensitive() {
        // Uppercase sorts before lowercase in byte order
        let mut vms = vec![vm("alpha", "stopped"), vm("Beta", "stopped")];
        sort_vms(&mut vms);
        let names: Vec<&str> = vms.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Beta", "alpha"]);
    }
}
