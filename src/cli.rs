use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vmpower")]
#[command(version)]
#[command(about = "Bulk power control for VMs on a Proxmox VE node", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to the sops-encrypted config file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Pick the VMs that should be running and reconcile (default)
    Power(PowerArgs),

    /// Show the node's VM inventory without changing anything
    Status,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Default)]
pub struct PowerArgs {
    /// Override the configured node name
    #[arg(short, long)]
    pub node: Option<String>,

    /// Cap on concurrent start/stop calls (0 = one per VM)
    #[arg(short, long, default_value = "0")]
    pub jobs: usize,
}
