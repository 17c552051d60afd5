//! Non-interactive inventory listing.

use anyhow::{Context, Result};
use colored::Colorize;
use log::warn;
use proxmox::{Credentials, Gateway, PveClient, sort_vms};

use crate::config::Config;
use crate::ui;

pub fn run(config: &Config) -> Result<()> {
    let client = PveClient::connect(
        &config.host,
        &Credentials::new(&config.username, &config.password),
    )
    .with_context(|| format!("Could not authenticate against {}", config.host))?;

    ui::header(&format!("Node {}", config.node));

    match client.version() {
        Ok(version) => ui::kv("Proxmox VE Version", &version),
        Err(e) => warn!("cannot obtain Proxmox VE version: {}", e),
    }

    client
        .node_status(&config.node)
        .with_context(|| format!("Node `{}` does not exist on {}", config.node, config.host))?;

    let mut vms = client.list_vms(&config.node).context("Could not list VMs")?;
    sort_vms(&mut vms);

    if vms.is_empty() {
        ui::dim("No virtual machines on this node");
        return Ok(());
    }

    println!();
    for vm in &vms {
        println!(
            "  {} {:<30} {}",
            ui::status_glyph(&vm.status),
            vm.name,
            vm.status.to_string().dimmed()
        );
    }

    let running = vms.iter().filter(|vm| vm.is_running()).count();
    println!();
    ui::kv(
        "Total",
        &format!(
            "{} VMs, {} running",
            vms.len().to_string().bold(),
            running.to_string().green()
        ),
    );

    Ok(())
}
