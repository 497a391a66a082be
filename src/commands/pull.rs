//! Pull command - download a distro rootfs.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::distro;
use crate::rootfs;

/// Execute the pull command.
pub fn cmd_pull(config: &Config, distro_name: &str, force: bool) -> Result<()> {
    let Some(distro) = distro::get(distro_name) else {
        bail!("unknown distro: {distro_name} (run 'rtbox list' to see available distros)");
    };

    println!(
        "Pulling rootfs for {} (Debian {}, glibc {})",
        distro.name, distro.version, distro.glibc_version
    );
    rootfs::pull(config, distro, force)?;
    println!("Successfully installed {}", distro.name);
    Ok(())
}
