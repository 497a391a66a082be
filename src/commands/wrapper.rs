//! Shell-wrapper command - emit a reusable environment setup script.

use anyhow::{anyhow, Result};

use crate::config::Config;
use crate::runtime;

/// Execute the shell-wrapper command.
///
/// The script goes to stdout so it can be redirected to a file:
///
/// ```text
/// rtbox shell-wrapper bookworm > rtbox-bookworm.sh
/// source rtbox-bookworm.sh
/// rtbox_run ./myapp
/// ```
pub fn cmd_wrapper(config: &Config, distro_name: &str) -> Result<()> {
    let script = runtime::wrapper_script(config, distro_name).map_err(|e| anyhow!("{e}"))?;
    println!("{script}");
    Ok(())
}
