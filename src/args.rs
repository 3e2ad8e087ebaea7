use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "berth")]
#[command(version)]
#[command(about = "Install and operate a local berth deployment", long_about = None)]
pub(crate) struct Cli {
    /// Print debug-level progress output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Override the config directory (default: $BERTH_CONFIG_DIR or ~/.config/berth)
    #[arg(long, global = true, value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Override the data directory (default: $BERTH_DATA_DIR or ~/.local/share/berth)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Install (first run) or start the deployment
    Up {
        /// Also start the inference engine
        #[arg(long)]
        all: bool,
    },

    /// Stop the deployment, preserving data
    Down {
        /// Also stop the inference engine
        #[arg(long)]
        all: bool,
    },

    /// Restart one service, or all services
    Restart {
        /// Service to restart (all when omitted)
        service: Option<String>,
    },

    /// Show container and version status
    Status,

    /// Show recent container logs
    Logs {
        /// Service to show logs for (all when omitted)
        service: Option<String>,

        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "100")]
        lines: usize,
    },

    /// Upgrade to the latest released image tag
    Upgrade,

    /// Show CLI build info and available updates
    Version {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and installation
    Check,

    /// Inspect or edit the configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Manage the local GPU inference engine
    Inference {
        #[command(subcommand)]
        command: InferenceCommands,
    },

    /// Remove the installation
    Uninstall {
        /// Also delete application data and configuration
        #[arg(long)]
        purge_data: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Report unknown and missing fields in the config file
    Drift,

    /// Change the image tag and persist it
    SetTag {
        /// New image tag
        tag: String,
    },
}

#[derive(Subcommand)]
pub(crate) enum InferenceCommands {
    /// Start the inference engine container
    Up,

    /// Stop and remove the inference engine container
    Down,

    /// Show inference engine container status
    Status,

    /// Show recent inference engine logs
    Logs {
        /// Number of recent lines to show
        #[arg(short = 'n', long, default_value = "100")]
        lines: usize,
    },
}
