//! List command - show available distros and their install status.

use anyhow::Result;
use serde_json::json;

use crate::config::Config;
use crate::distro;
use crate::rootfs;

/// Execute the list command.
pub fn cmd_list(config: &Config, installed_only: bool, json: bool) -> Result<()> {
    let installed: Vec<&str> = rootfs::installed_distros(config)
        .iter()
        .map(|d| d.name)
        .collect();

    if json {
        let entries: Vec<_> = distro::all()
            .iter()
            .filter(|d| !installed_only || installed.contains(&d.name))
            .map(|d| {
                json!({
                    "name": d.name,
                    "version": d.version,
                    "glibc_version": d.glibc_version,
                    "installed": installed.contains(&d.name),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    println!("{:<12} {:<8} {:<8} {}", "NAME", "VERSION", "GLIBC", "STATUS");
    for d in distro::all() {
        let is_installed = installed.contains(&d.name);
        if installed_only && !is_installed {
            continue;
        }
        let status = if is_installed { "installed" } else { "" };
        println!(
            "{:<12} {:<8} {:<8} {}",
            d.name, d.version, d.glibc_version, status
        );
    }
    Ok(())
}
