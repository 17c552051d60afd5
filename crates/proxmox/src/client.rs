//! Blocking Proxmox VE API client.
//!
//! Implements ticket (cookie) authentication: one `POST /access/ticket`
//! at construction yields a `PVEAuthCookie` plus a CSRF prevention token,
//! which every later request carries. Tickets are valid for two hours,
//! far longer than a power-control run, so there is no refresh logic.

use crate::error::{Error, Result};
use crate::gateway::Gateway;
use crate::types::{NodeStatus, VirtualMachine};
use log::debug;
use serde::Deserialize;
use ureq::Agent;
use ureq::tls::TlsConfig;

/// Username and password for ticket authentication.
///
/// The username must carry its realm, e.g. `root@pam`.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// User in `name@realm` form.
    pub username: String,
    /// Password for the user.
    pub password: String,
}

impl Credentials {
    /// Create credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Authenticated client for one Proxmox VE API endpoint.
pub struct PveClient {
    agent: Agent,
    base_url: String,
    ticket: String,
    csrf_token: String,
}

/// Every Proxmox VE response wraps its payload in a `data` field.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct TicketData {
    ticket: String,
    #[serde(rename = "CSRFPreventionToken")]
    csrf_token: String,
}

#[derive(Debug, Deserialize)]
struct VersionData {
    release: String,
}

/// Wire shape of one entry under `/nodes/{node}/qemu`. The API returns
/// many more fields; the rest are ignored.
#[derive(Debug, Deserialize)]
struct QemuEntry {
    vmid: u64,
    name: String,
    status: String,
}

/// One cluster member from `/nodes`.
#[derive(Debug, Deserialize)]
struct NodeEntry {
    node: String,
}

impl PveClient {
    /// Authenticate against `host` and return a ready client.
    ///
    /// `host` is `hostname:port` or `ip:port`; the `https://` scheme and
    /// `/api2/json` prefix are added here. When the host starts with a
    /// digit it is assumed to be a bare IP without a matching certificate,
    /// and TLS verification is disabled.
    ///
    /// # Errors
    ///
    /// Returns `Error::Auth` if the API rejects the credentials, or
    /// `Error::Http` on transport failure.
    pub fn connect(host: &str, credentials: &Credentials) -> Result<Self> {
        let insecure = host.as_bytes().first().is_some_and(u8::is_ascii_digit);
        Self::connect_with(host, credentials, insecure)
    }

    /// Authenticate with explicit control over TLS verification.
    pub fn connect_with(host: &str, credentials: &Credentials, insecure: bool) -> Result<Self> {
        let agent = if insecure {
            debug!("host {} looks like an IP, disabling TLS verification", host);
            Agent::new_with_config(
                Agent::config_builder()
                    .tls_config(TlsConfig::builder().disable_verification(true).build())
                    .build(),
            )
        } else {
            Agent::new_with_defaults()
        };

        let base_url = format!("https://{}/api2/json", host);
        let ticket_url = format!("{}/access/ticket", base_url);

        let mut response = agent
            .post(&ticket_url)
            .send_form([
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .map_err(|e| match e {
                ureq::Error::StatusCode(401) => Error::Auth {
                    username: credentials.username.clone(),
                    message: "invalid credentials".to_string(),
                },
                other => other.into(),
            })?;

        let envelope: Envelope<TicketData> = response.body_mut().read_json()?;

        Ok(Self {
            agent,
            base_url,
            ticket: envelope.data.ticket,
            csrf_token: envelope.data.csrf_token,
        })
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut response = self
            .agent
            .get(&url)
            .header("Cookie", &format!("PVEAuthCookie={}", self.ticket))
            .call()?;

        let envelope: Envelope<T> = response.body_mut().read_json()?;
        Ok(envelope.data)
    }

    fn post_empty(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        self.agent
            .post(&url)
            .header("Cookie", &format!("PVEAuthCookie={}", self.ticket))
            .header("CSRFPreventionToken", &self.csrf_token)
            .send_empty()?;
        Ok(())
    }
}

/// An answered request with an error status is an API rejection; anything
/// the server never answered stays a transport error so callers can tell
/// the two apart.
fn classify_power_error(operation: &'static str, vmid: u64, err: Error) -> Error {
    match err {
        Error::Http {
            message,
            status: Some(_),
        } => Error::api(operation, vmid, message),
        other => other,
    }
}

impl Gateway for PveClient {
    fn version(&self) -> Result<String> {
        let version: VersionData = self.get_json("/version")?;
        Ok(version.release)
    }

    fn node_status(&self, node: &str) -> Result<NodeStatus> {
        match self.get_json(&format!("/nodes/{}/status", node)) {
            Ok(status) => Ok(status),
            // The API answers 500 ("hostname lookup failed") for an
            // unknown node name, but a 500 can also be a genuine server
            // fault. The node list decides which one this was.
            Err(
                e @ Error::Http {
                    status: Some(500 | 595),
                    ..
                },
            ) => {
                let nodes: Vec<NodeEntry> = self.get_json("/nodes")?;
                if nodes.iter().any(|n| n.node == node) {
                    Err(e)
                } else {
                    Err(Error::NodeNotFound(node.to_string()))
                }
            }
            Err(e) => Err(e),
        }
    }

    fn list_vms(&self, node: &str) -> Result<Vec<VirtualMachine>> {
        let entries: Vec<QemuEntry> = self.get_json(&format!("/nodes/{}/qemu", node))?;
        debug!("node {} reports {} VMs", node, entries.len());
        Ok(entries
            .into_iter()
            .map(|e| VirtualMachine {
                vmid: e.vmid,
                name: e.name,
                status: e.status.into(),
            })
            .collect())
    }

    fn start_vm(&self, node: &str, vmid: u64) -> Result<()> {
        self.post_empty(&format!("/nodes/{}/qemu/{}/status/start", node, vmid))
            .map_err(|e| classify_power_error("start", vmid, e))
    }

    fn stop_vm(&self, node: &str, vmid: u64) -> Result<()> {
        self.post_empty(&format!("/nodes/{}/qemu/{}/status/stop", node, vmid))
            .map_err(|e| classify_power_error("stop", vmid, e))
    }
}
