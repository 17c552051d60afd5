use anyhow::{Context, Result};
use colored::Colorize;
use dialoguer::MultiSelect;
use dialoguer::theme::ColorfulTheme;
use proxmox::{VirtualMachine, VmStatus};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Status glyph for a VM entry.
pub fn status_glyph(status: &VmStatus) -> &'static str {
    match status {
        VmStatus::Running => "✅",
        VmStatus::Stopped => "🛑",
        VmStatus::Other(_) => "❓",
    }
}

/// Present the inventory as a checkbox list and return the power-on set.
///
/// Entries are pre-checked when the VM is currently running, so an
/// untouched form reproduces the node's current state. Returns `None`
/// when the operator cancels the form (Esc/q).
pub fn select_power_on(vms: &[VirtualMachine]) -> Result<Option<Vec<String>>> {
    let labels: Vec<String> = vms
        .iter()
        .map(|vm| format!("{} {}", status_glyph(&vm.status), vm.name))
        .collect();
    let checked: Vec<bool> = vms.iter().map(VirtualMachine::is_running).collect();

    let selection = MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt("Select Virtual Machines you want to Power On")
        .items(&labels)
        .defaults(&checked)
        .interact_opt()
        .context("Could not render selection form")?;

    Ok(selection.map(|indices| {
        indices
            .into_iter()
            .map(|i| vms[i].name.clone())
            .collect()
    }))
}
