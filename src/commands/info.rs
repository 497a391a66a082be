//! Info command - show details of an installed rootfs.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::rootfs;

/// Execute the info command.
pub fn cmd_info(config: &Config, distro_name: &str, json: bool) -> Result<()> {
    let Some(info) = rootfs::info(config, distro_name)? else {
        bail!(
            "rootfs for {distro_name} is not installed, run: rtbox pull {distro_name}"
        );
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("Rootfs info: {}", info.name);
    println!("  Debian version: {}", info.version);
    println!("  glibc version:  {}", info.glibc_version);
    println!("  Path:           {}", info.path.display());
    println!("  Size:           {:.1} MB", info.size_mb);
    Ok(())
}
