//! CLI command handlers.
//!
//! Each submodule handles a specific CLI command:
//! - `list` - List available distros and install status
//! - `pull` - Download and extract a rootfs
//! - `remove` - Delete an installed rootfs
//! - `info` - Show details of an installed rootfs
//! - `run` - Run or exec a command under a distro's glibc
//! - `wrapper` - Emit the shell wrapper script

pub mod info;
pub mod list;
pub mod pull;
pub mod remove;
pub mod run;
pub mod wrapper;

pub use info::cmd_info;
pub use list::cmd_list;
pub use pull::cmd_pull;
pub use remove::cmd_remove;
pub use run::{cmd_exec, cmd_run};
pub use wrapper::cmd_wrapper;
