//! Rootfs management - download, inspect and remove distro rootfs trees.
//!
//! Images come from the LXC image server, so no container runtime is needed:
//! the rootfs.tar.xz is downloaded with curl and extracted with tar straight
//! into the rtbox home. The runtime treats the extracted tree as read-only;
//! install and removal live here.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::Config;
use crate::distro::{self, Distro};
use crate::process::Cmd;

/// LXC image server base URL.
pub const LXC_IMAGE_SERVER: &str = "https://images.linuxcontainers.org";

/// Check if a rootfs is installed.
///
/// Installed means the directory exists and contains a `lib` or `lib64`
/// subdirectory. Necessary but not sufficient for a fully functional rootfs;
/// loader resolution reports corruption at run time.
pub fn is_installed(config: &Config, distro_name: &str) -> bool {
    let rootfs = config.distro_rootfs(distro_name);
    rootfs.join("lib").exists() || rootfs.join("lib64").exists()
}

/// Catalog entries whose rootfs is installed, in catalog order.
pub fn installed_distros(config: &Config) -> Vec<&'static Distro> {
    distro::all()
        .iter()
        .filter(|d| is_installed(config, d.name))
        .collect()
}

/// Current machine architecture in LXC naming.
fn lxc_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "aarch64" => "arm64",
        "arm" => "armhf",
        "powerpc64" => "ppc64el",
        other => other,
    }
}

/// Extract date-stamped build directories from an image server listing.
///
/// Entries look like `href="20251206_05:24/"`; the colon may arrive
/// URL-encoded as `%3A`. Returns normalized names, sorted ascending so the
/// last entry is the latest build.
pub fn parse_image_listing(html: &str) -> Vec<String> {
    let mut builds = Vec::new();
    for chunk in html.split("href=\"").skip(1) {
        let Some(end) = chunk.find('"') else { continue };
        let entry = &chunk[..end];
        let Some(name) = entry.strip_suffix('/') else { continue };
        let name = name.replace("%3A", ":");
        if is_build_stamp(&name) {
            builds.push(name);
        }
    }
    builds.sort();
    builds.dedup();
    builds
}

/// True for names shaped like `YYYYMMDD_HH:MM`.
fn is_build_stamp(name: &str) -> bool {
    let bytes = name.as_bytes();
    if bytes.len() != 14 {
        return false;
    }
    bytes[..8].iter().all(|b| b.is_ascii_digit())
        && bytes[8] == b'_'
        && bytes[9].is_ascii_digit()
        && bytes[10].is_ascii_digit()
        && bytes[11] == b':'
        && bytes[12].is_ascii_digit()
        && bytes[13].is_ascii_digit()
}

/// URL of the latest rootfs.tar.xz for a distro and architecture.
fn latest_image_url(distro_name: &str, arch: &str) -> Result<String> {
    let base_url = format!("{LXC_IMAGE_SERVER}/images/debian/{distro_name}/{arch}/default/");

    let listing = Cmd::new("curl")
        .args(["-fsSL", &base_url])
        .error_msg(format!("Failed to fetch image list for {distro_name}"))
        .run()?;

    let mut builds = parse_image_listing(&listing.stdout);
    let latest = builds.pop().with_context(|| {
        format!("No images found for {distro_name} on {arch}. Check {base_url}")
    })?;

    Ok(format!("{}{}/rootfs.tar.xz", base_url, latest.replace(':', "%3A")))
}

/// Pull a rootfs from the LXC image server.
///
/// Downloads the latest rootfs.tar.xz and extracts it into the distro's
/// rootfs path. An existing complete rootfs is kept unless `force` is set;
/// an existing but incomplete directory is removed and re-pulled.
pub fn pull(config: &Config, distro: &Distro, force: bool) -> Result<PathBuf> {
    config.ensure_dirs()?;
    let rootfs_path = config.distro_rootfs(distro.name);

    if rootfs_path.exists() {
        if !force && is_installed(config, distro.name) {
            println!(
                "Rootfs for {} already exists. Use --force to re-download.",
                distro.name
            );
            return Ok(rootfs_path);
        }
        // Forced, or the directory exists but is incomplete
        fs::remove_dir_all(&rootfs_path).with_context(|| {
            format!("Failed to remove existing rootfs at {}", rootfs_path.display())
        })?;
    }

    fs::create_dir_all(&rootfs_path)?;

    let arch = lxc_arch();
    println!("Finding latest {} image for {}...", distro.name, arch);
    let url = latest_image_url(distro.name, arch)?;

    let tarball = config.rootfs_dir().join(format!("{}.rootfs.tar.xz", distro.name));
    let result = download_and_extract(&url, &tarball, &rootfs_path);
    let _ = fs::remove_file(&tarball);
    result?;

    Ok(rootfs_path)
}

fn download_and_extract(url: &str, tarball: &Path, rootfs_path: &Path) -> Result<()> {
    println!("Downloading {}", url);
    Cmd::new("curl")
        .args(["-fL", "--progress-bar", "-o"])
        .arg_path(tarball)
        .arg(url)
        .error_msg("Failed to download rootfs")
        .run_interactive()?;

    println!("Extracting rootfs...");
    Cmd::new("tar")
        .arg("-xJf")
        .arg_path(tarball)
        .arg("-C")
        .arg_path(rootfs_path)
        .error_msg("Failed to extract rootfs")
        .run()?;

    Ok(())
}

/// Remove an installed rootfs. Returns false if nothing was on disk.
pub fn remove(config: &Config, distro_name: &str) -> Result<bool> {
    let rootfs_path = config.distro_rootfs(distro_name);
    if !rootfs_path.exists() {
        return Ok(false);
    }
    fs::remove_dir_all(&rootfs_path).with_context(|| {
        format!("Failed to remove rootfs at {}", rootfs_path.display())
    })?;
    Ok(true)
}

/// Information about an installed rootfs.
#[derive(Debug, Serialize)]
pub struct RootfsInfo {
    /// Distro codename.
    pub name: &'static str,
    /// Debian release version.
    pub version: &'static str,
    /// glibc version: detected from the rootfs when possible, else the
    /// catalog value.
    pub glibc_version: String,
    /// Absolute rootfs path.
    pub path: PathBuf,
    /// Total size of the tree in megabytes.
    pub size_mb: f64,
}

/// Gather information about an installed rootfs.
pub fn info(config: &Config, distro_name: &str) -> Result<Option<RootfsInfo>> {
    let Some(distro) = distro::get(distro_name) else {
        bail!("unknown distro: {distro_name}");
    };
    if !is_installed(config, distro.name) {
        return Ok(None);
    }

    let rootfs_path = config.distro_rootfs(distro.name);
    let total_bytes: u64 = WalkDir::new(&rootfs_path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum();

    let glibc_version = detect_glibc_version(&rootfs_path)
        .unwrap_or_else(|| distro.glibc_version.to_string());

    Ok(Some(RootfsInfo {
        name: distro.name,
        version: distro.version,
        glibc_version,
        path: rootfs_path,
        size_mb: total_bytes as f64 / (1024.0 * 1024.0),
    }))
}

/// Detect the actual glibc version in a rootfs.
///
/// Scans libc.so.6 for the "release version" banner glibc embeds, e.g.
/// "... stable release version 2.36.".
pub fn detect_glibc_version(rootfs_path: &Path) -> Option<String> {
    let lib_dirs = [
        "lib/x86_64-linux-gnu",
        "lib64",
        "lib",
        "lib/aarch64-linux-gnu",
    ];

    for dir in lib_dirs {
        let libc = rootfs_path.join(dir).join("libc.so.6");
        let Ok(data) = fs::read(&libc) else { continue };
        if let Some(version) = scan_release_version(&data) {
            return Some(version);
        }
    }
    None
}

fn scan_release_version(data: &[u8]) -> Option<String> {
    const NEEDLE: &[u8] = b"release version ";
    let pos = data.windows(NEEDLE.len()).position(|w| w == NEEDLE)?;
    let rest = &data[pos + NEEDLE.len()..];
    let end = rest
        .iter()
        .position(|b| !(b.is_ascii_digit() || *b == b'.'))
        .unwrap_or(rest.len());
    let version = std::str::from_utf8(&rest[..end])
        .ok()?
        .trim_end_matches('.')
        .to_string();
    if version.is_empty() {
        None
    } else {
        Some(version)
    }
}
