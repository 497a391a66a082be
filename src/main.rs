//! rtbox - run binaries with a different glibc version.
//!
//! Useful on machines where you are stuck with an old system glibc (HPC
//! clusters, long-lived servers) but need to run or build against a newer
//! one: pull a Debian rootfs once, then run programs through its loader.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use rtbox::commands::{self, run::RunOptions};
use rtbox::config::Config;

#[derive(Parser)]
#[command(name = "rtbox")]
#[command(about = "Run binaries with different glibc versions")]
#[command(version)]
#[command(
    after_help = "QUICK START:\n  rtbox list                  List available distros\n  rtbox pull bookworm         Download Debian bookworm rootfs\n  rtbox run bookworm ./myapp  Run myapp with bookworm's glibc\n  rtbox run bookworm make     Build with bookworm's glibc"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List available Debian distributions
    List {
        /// Show only installed rootfs
        #[arg(short, long)]
        installed: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Download a Debian rootfs (codename or version number)
    Pull {
        /// Distro codename (bookworm) or version number (12)
        distro: String,
        /// Force re-download even if already installed
        #[arg(short, long)]
        force: bool,
    },

    /// Remove an installed rootfs
    Remove {
        /// Distro codename or version number
        distro: String,
    },

    /// Show information about an installed rootfs
    Info {
        /// Distro codename or version number
        distro: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run a command with a specific glibc version
    #[command(visible_alias = "build")]
    Run {
        /// Distro codename or version number
        distro: String,
        /// Command and arguments to run
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
        /// Additional library paths
        #[arg(short = 'L', long = "lib-path")]
        lib_path: Vec<String>,
        /// Environment variables (KEY=VALUE)
        #[arg(short = 'e', long = "env")]
        env: Vec<String>,
        /// Working directory
        #[arg(short = 'C', long = "cwd")]
        cwd: Option<PathBuf>,
        /// Copy the host environment (minus loader tunables) instead of the
        /// default clean allow-list environment
        #[arg(long)]
        keep_host_env: bool,
    },

    /// Replace this process with a command under a specific glibc version
    Exec {
        /// Distro codename or version number
        distro: String,
        /// Command and arguments to run
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        command: Vec<String>,
        /// Additional library paths
        #[arg(short = 'L', long = "lib-path")]
        lib_path: Vec<String>,
        /// Environment variables (KEY=VALUE)
        #[arg(short = 'e', long = "env")]
        env: Vec<String>,
        /// Working directory
        #[arg(short = 'C', long = "cwd")]
        cwd: Option<PathBuf>,
        /// Copy the host environment (minus loader tunables)
        #[arg(long)]
        keep_host_env: bool,
    },

    /// Generate a shell wrapper script for a distro
    ShellWrapper {
        /// Distro codename or version number
        distro: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = Config::from_env();

    let result = match cli.command {
        Commands::List { installed, json } => {
            commands::cmd_list(&config, installed, json).map(|()| 0)
        }
        Commands::Pull { distro, force } => {
            commands::cmd_pull(&config, &distro, force).map(|()| 0)
        }
        Commands::Remove { distro } => commands::cmd_remove(&config, &distro).map(|()| 0),
        Commands::Info { distro, json } => {
            commands::cmd_info(&config, &distro, json).map(|()| 0)
        }
        Commands::Run {
            distro,
            command,
            lib_path,
            env,
            cwd,
            keep_host_env,
        } => commands::cmd_run(
            &config,
            RunOptions {
                distro,
                command,
                lib_paths: lib_path,
                env,
                cwd,
                keep_host_env,
            },
        ),
        Commands::Exec {
            distro,
            command,
            lib_path,
            env,
            cwd,
            keep_host_env,
        } => commands::cmd_exec(
            &config,
            RunOptions {
                distro,
                command,
                lib_paths: lib_path,
                env,
                cwd,
                keep_host_env,
            },
        )
        .map(|()| 0),
        Commands::ShellWrapper { distro } => {
            commands::cmd_wrapper(&config, &distro).map(|()| 0)
        }
    };

    match result {
        // Propagate the child's exit code unchanged
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
