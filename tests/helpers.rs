//! Shared test utilities for rtbox tests.
#![allow(dead_code)] // not every test binary uses every helper

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use rtbox::config::Config;
use tempfile::TempDir;

/// Test environment with a temporary rtbox home.
pub struct TestEnv {
    /// Temporary directory (kept alive for lifetime of TestEnv)
    pub _temp_dir: TempDir,
    /// Config rooted in the temporary home.
    pub config: Config,
}

impl TestEnv {
    /// Create a new test environment with a temporary rtbox home.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config::new(temp_dir.path().join(".rtbox"));
        Self {
            _temp_dir: temp_dir,
            config,
        }
    }

    /// Create an empty rootfs directory for a distro and return its path.
    pub fn create_rootfs_dir(&self, distro_name: &str) -> PathBuf {
        let rootfs = self.config.distro_rootfs(distro_name);
        fs::create_dir_all(&rootfs).expect("Failed to create rootfs dir");
        rootfs
    }

    /// Create a minimal installed rootfs (lib dirs, bin, loader) for a
    /// distro and return its path.
    pub fn create_mock_rootfs(&self, distro_name: &str) -> PathBuf {
        let rootfs = self.create_rootfs_dir(distro_name);
        populate_mock_rootfs(&rootfs);
        rootfs
    }
}

/// Fill a directory with the minimal structure of a Debian rootfs:
/// lib dirs, a real loader in the triplet directory and a `/bin/ls` stub.
pub fn populate_mock_rootfs(rootfs: &Path) {
    for dir in [
        "lib/x86_64-linux-gnu",
        "lib64",
        "usr/lib",
        "usr/lib/x86_64-linux-gnu",
        "bin",
        "etc",
    ] {
        fs::create_dir_all(rootfs.join(dir)).expect("Failed to create rootfs dir");
    }

    fs::write(
        rootfs.join("lib/x86_64-linux-gnu/ld-linux-x86-64.so.2"),
        b"\x7fELF fake loader",
    )
    .expect("Failed to create loader");
    fs::write(rootfs.join("bin/ls"), b"\x7fELF fake ls").expect("Failed to create ls");
}

/// Write an executable shell script at `path`.
pub fn create_executable_script(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create script dir");
    }
    fs::write(path, contents).expect("Failed to write script");
    let mut perms = fs::metadata(path).expect("stat script").permissions();
    perms.set_mode(0o755);
    fs::set_permissions(path, perms).expect("chmod script");
}

/// Create a symlink, replacing any existing file at the link path.
pub fn create_symlink(target: &str, link: &Path) {
    if let Some(parent) = link.parent() {
        fs::create_dir_all(parent).expect("Failed to create link dir");
    }
    let _ = fs::remove_file(link);
    std::os::unix::fs::symlink(target, link).expect("Failed to create symlink");
}
