use anyhow::{Context, Result, bail};
use log::{debug, info};
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Connection settings for one Proxmox VE node.
///
/// Loaded once at startup and passed by reference into everything that
/// needs it. Field names on disk mirror the environment variable names so
/// the same keys work in both sources.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// API host, `hostname:port` or `ip:port`.
    #[serde(rename = "PROXMOX_VE_HOST")]
    pub host: String,

    /// User in `name@realm` form.
    #[serde(rename = "PROXMOX_VE_USERNAME")]
    pub username: String,

    /// Password for ticket authentication.
    #[serde(rename = "PROXMOX_VE_PASSWORD")]
    pub password: String,

    /// Node whose VMs are managed.
    #[serde(rename = "PROXMOX_VE_NODENAME")]
    pub node: String,
}

/// Default location of the encrypted config file.
pub fn config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home
        .join(".config")
        .join("vmpower")
        .join("vmpower.sops.yaml"))
}

impl Config {
    /// Load configuration from the sops-encrypted file, falling back to
    /// environment variables when the file does not exist.
    ///
    /// Either source failing to produce all four settings is fatal.
    pub fn load(path_override: Option<&Path>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p.to_path_buf(),
            None => config_path()?,
        };

        if path.exists() {
            debug!("loading config from {}", path.display());
            Self::from_sops_file(&path)
        } else {
            info!(
                "{} does not exist, reading environment instead",
                path.display()
            );
            Self::from_env()
        }
    }

    /// Decrypt the config file with `sops` and parse it.
    fn from_sops_file(path: &Path) -> Result<Self> {
        let output = Command::new("sops")
            .arg("--decrypt")
            .arg(path)
            .output()
            .context("Could not run sops (is it installed?)")?;

        if !output.status.success() {
            bail!(
                "Failed to decrypt {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        let yaml = String::from_utf8(output.stdout).context("sops output is not valid UTF-8")?;
        Self::from_yaml(&yaml).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Parse decrypted YAML content.
    fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read all four settings from the environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from a key lookup. Split out of [`Config::from_env`]
    /// so the fallback path is testable without mutating process state.
    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key).with_context(|| format!("Missing environment variable {}", key))
        };

        let config = Self {
            host: get("PROXMOX_VE_HOST")?,
            username: get("PROXMOX_VE_USERNAME")?,
            password: get("PROXMOX_VE_PASSWORD")?,
            node: get("PROXMOX_VE_NODENAME")?,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("PROXMOX_VE_HOST", &self.host),
            ("PROXMOX_VE_USERNAME", &self.username),
            ("PROXMOX_VE_PASSWORD", &self.password),
            ("PROXMOX_VE_NODENAME", &self.node),
        ] {
            if value.trim().is_empty() {
                bail!("Config field {} is empty", field);
            }
        }
        Ok(())
    }
}
