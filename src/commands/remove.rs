//! Remove command - delete an installed rootfs.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::distro;
use crate::rootfs;

/// Execute the remove command.
pub fn cmd_remove(config: &Config, distro_name: &str) -> Result<()> {
    let Some(distro) = distro::get(distro_name) else {
        bail!("unknown distro: {distro_name}");
    };

    if !rootfs::is_installed(config, distro.name) {
        bail!("rootfs for {} is not installed", distro.name);
    }

    if rootfs::remove(config, distro.name)? {
        println!("Removed rootfs for {}", distro.name);
        Ok(())
    } else {
        bail!("failed to remove rootfs for {}", distro.name);
    }
}
