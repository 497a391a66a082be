//! Configuration and paths for rtbox.
//!
//! All path resolution goes through an explicit `Config` value constructed
//! once in `main` and threaded through every call. Nothing reads the rtbox
//! home from ambient state after startup, which keeps resolution
//! deterministic and testable against synthetic directories.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Environment variable that overrides the rtbox home directory.
pub const RTBOX_HOME_ENV: &str = "RTBOX_HOME";

/// rtbox configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for all rtbox state (default: ~/.rtbox).
    home: PathBuf,
}

impl Config {
    /// Create a configuration rooted at an explicit home directory.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Load configuration from the environment.
    ///
    /// Uses `RTBOX_HOME` if set, otherwise `~/.rtbox`. Falls back to
    /// `.rtbox` in the current directory if the home directory cannot be
    /// determined (containers without passwd entries).
    pub fn from_env() -> Self {
        if let Ok(home) = std::env::var(RTBOX_HOME_ENV) {
            return Self::new(home);
        }
        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(base.join(".rtbox"))
    }

    /// The rtbox home directory.
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Directory where rootfs trees are stored.
    pub fn rootfs_dir(&self) -> PathBuf {
        self.home.join("rootfs")
    }

    /// Rootfs path for a specific distro. Pure join, no filesystem access.
    pub fn distro_rootfs(&self, distro_name: &str) -> PathBuf {
        self.rootfs_dir().join(distro_name)
    }

    /// Ensure the rootfs storage directory exists.
    pub fn ensure_dirs(&self) -> Result<()> {
        let dir = self.rootfs_dir();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distro_rootfs_is_pure_join() {
        let config = Config::new("/srv/rtbox");
        assert_eq!(
            config.distro_rootfs("bookworm"),
            PathBuf::from("/srv/rtbox/rootfs/bookworm")
        );
    }

    #[test]
    fn test_rootfs_dir_under_home() {
        let config = Config::new("/home/user/.rtbox");
        assert_eq!(
            config.rootfs_dir(),
            PathBuf::from("/home/user/.rtbox/rootfs")
        );
    }
}
