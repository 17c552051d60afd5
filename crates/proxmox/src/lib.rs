//! # proxmox
//!
//! Minimal blocking client for the Proxmox VE HTTP API, scoped to what a
//! single-node power-control tool needs:
//! - Ticket (cookie) authentication
//! - Node status and API version lookup
//! - QEMU inventory listing for one node
//! - Start/stop of individual virtual machines
//!
//! ## Example
//!
//! ```no_run
//! use proxmox::{Credentials, Gateway, PveClient};
//!
//! let client = PveClient::connect(
//!     "pve.example.com:8006",
//!     &Credentials::new("root@pam", "secret"),
//! ).expect("authentication failed");
//!
//! println!("Proxmox VE {}", client.version().unwrap());
//!
//! let mut vms = client.list_vms("pve").unwrap();
//! proxmox::sort_vms(&mut vms);
//! for vm in &vms {
//!     println!("{} ({})", vm.name, vm.status);
//! }
//! ```
//!
//! ## Testing
//!
//! The [`Gateway`] trait abstracts the API surface so callers can run
//! against [`gateway::MockGateway`] without a live cluster.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod gateway;
pub mod types;

pub use client::{Credentials, PveClient};
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use types::{NodeStatus, VirtualMachine, VmStatus, sort_vms};
