//! Error types for rootfs resolution and launching.
//!
//! Every resolution-stage failure is raised before any subprocess exists, so
//! callers can rely on these variants to mean "nothing was executed" — except
//! `CommandSpawnFailed`, which wraps the OS error from the spawn itself.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from the resolution pipeline and the launcher.
#[derive(Debug, Error)]
pub enum RtboxError {
    /// The requested distro is not in the catalog.
    #[error("unknown distro: {0} (run 'rtbox list' to see available distros)")]
    UnknownDistro(String),

    /// The distro is known but its rootfs has not been pulled.
    #[error("rootfs for {distro} is not installed, run: rtbox pull {distro}")]
    RootfsNotInstalled {
        /// Distro whose rootfs is missing.
        distro: String,
    },

    /// No usable dynamic loader was found inside the rootfs.
    #[error(
        "could not find a usable dynamic loader in rootfs at {rootfs} \
         (tried {tried:?}); the rootfs may be incomplete or corrupted"
    )]
    LoaderNotFound {
        /// Rootfs that was searched.
        rootfs: PathBuf,
        /// Candidate locations that were probed or rejected.
        tried: Vec<PathBuf>,
    },

    /// The loader invocation itself could not be started.
    #[error("failed to launch {program}: {source}")]
    CommandSpawnFailed {
        /// Program we attempted to execute (the loader path).
        program: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A `KEY=VALUE` environment override was malformed.
    #[error("invalid environment variable {0:?}, use format: KEY=VALUE")]
    InvalidEnvOverride(String),
}

/// Result alias for the runtime core.
pub type Result<T> = std::result::Result<T, RtboxError>;
