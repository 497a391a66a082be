//! Runtime execution - run binaries with a specific glibc version.
//!
//! The pipeline is strictly linear and fail-fast: resolve distro, verify the
//! rootfs is installed, resolve the loader, rewrite the command path, collect
//! library paths, build the environment, launch. Every resolution error is
//! raised before any subprocess is created, and nothing is retried: launching
//! a program is not idempotent.

pub mod env;
pub mod loader;

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::io::ErrorKind;
use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::Config;
use crate::distro::{self, Distro};
use crate::error::{Result, RtboxError};
use crate::rootfs;

pub use env::SanitizePolicy;

/// One execution request, as assembled by the CLI layer.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    /// Distro codename or version number.
    pub distro: String,
    /// Program and arguments. Absolute program paths are resolved into the
    /// rootfs when the file exists there.
    pub command: Vec<String>,
    /// Additional library paths, appended after the rootfs paths.
    pub extra_lib_paths: Vec<String>,
    /// Working directory for the child.
    pub working_dir: Option<PathBuf>,
    /// Caller environment overrides, applied last with highest precedence.
    pub env_overrides: BTreeMap<String, String>,
    /// Host environment sanitization policy.
    pub policy: SanitizePolicy,
}

impl ExecutionRequest {
    /// A request with default options for the given distro and command.
    pub fn new(distro: impl Into<String>, command: Vec<String>) -> Self {
        Self {
            distro: distro.into(),
            command,
            extra_lib_paths: Vec::new(),
            working_dir: None,
            env_overrides: BTreeMap::new(),
            policy: SanitizePolicy::default(),
        }
    }
}

/// A fully resolved loader invocation, ready to spawn.
///
/// Produced by [`prepare`] without touching any process state, so tests can
/// assert on the exact invocation (or on resolution failure) knowing nothing
/// was executed.
#[derive(Debug, Clone)]
pub struct PreparedLaunch {
    /// Resolved loader executable inside the rootfs.
    pub loader: PathBuf,
    /// Full argv: loader, `--library-path`, joined paths, resolved command.
    pub argv: Vec<String>,
    /// Sanitized child environment.
    pub env: BTreeMap<String, String>,
    /// Working directory override.
    pub working_dir: Option<PathBuf>,
}

impl PreparedLaunch {
    /// The colon-joined library path passed to the loader.
    pub fn library_path(&self) -> &str {
        &self.argv[2]
    }
}

/// Parse a `KEY=VALUE` environment override.
pub fn parse_env_override(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => {
            Ok((key.to_string(), value.to_string()))
        }
        _ => Err(RtboxError::InvalidEnvOverride(raw.to_string())),
    }
}

/// Resolve command paths relative to the rootfs.
///
/// An absolute `argv[0]` (e.g. `/bin/ls`) is rewritten to the rootfs copy
/// when that file exists, so the binary comes from the rootfs rather than
/// the host. Otherwise the command is left untouched and the loader fails
/// naturally if the program is genuinely absent.
pub fn resolve_command(rootfs: &Path, command: &[String]) -> Vec<String> {
    let mut resolved = command.to_vec();
    if let Some(program) = resolved.first() {
        if let Some(rel) = program.strip_prefix('/') {
            let in_rootfs = rootfs.join(rel);
            if in_rootfs.exists() {
                resolved[0] = in_rootfs.to_string_lossy().into_owned();
            }
        }
    }
    resolved
}

fn lookup_distro(name: &str) -> Result<&'static Distro> {
    distro::get(name).ok_or_else(|| RtboxError::UnknownDistro(name.to_string()))
}

/// Resolve a request into a concrete loader invocation.
///
/// The host environment is passed explicitly; `run` and `exec` feed in
/// `std::env::vars()`. No subprocess is created here.
pub fn prepare(
    config: &Config,
    request: &ExecutionRequest,
    host_env: &BTreeMap<String, String>,
) -> Result<PreparedLaunch> {
    let distro = lookup_distro(&request.distro)?;

    if !rootfs::is_installed(config, distro.name) {
        return Err(RtboxError::RootfsNotInstalled {
            distro: distro.name.to_string(),
        });
    }
    let rootfs_path = config.distro_rootfs(distro.name);

    let loader = loader::find_loader(&rootfs_path)?;
    let resolved_command = resolve_command(&rootfs_path, &request.command);

    let lib_paths = env::collect_lib_paths(&rootfs_path);
    let child_env = env::build_env(
        &rootfs_path,
        host_env,
        &lib_paths,
        &request.extra_lib_paths,
        &request.env_overrides,
        request.policy,
    );

    // LD_LIBRARY_PATH is always set by build_env; reuse it verbatim so the
    // loader searches exactly what the child sees.
    let library_path = child_env
        .get("LD_LIBRARY_PATH")
        .cloned()
        .unwrap_or_default();

    let mut argv = vec![
        loader.to_string_lossy().into_owned(),
        "--library-path".to_string(),
        library_path,
    ];
    if request.policy == SanitizePolicy::KeepHostEnv {
        // With the host environment along for the ride, embedded RPATH/RUNPATH
        // entries must not be allowed to resolve against host libraries.
        argv.push("--inhibit-rpath".to_string());
        argv.push(String::new());
    }
    argv.extend(resolved_command);

    Ok(PreparedLaunch {
        loader,
        argv,
        env: child_env,
        working_dir: request.working_dir.clone(),
    })
}

fn host_env_snapshot() -> BTreeMap<String, String> {
    std::env::vars().collect()
}

fn build_command(prepared: &PreparedLaunch) -> Command {
    let mut cmd = Command::new(&prepared.argv[0]);
    cmd.args(&prepared.argv[1..]);
    cmd.env_clear();
    cmd.envs(&prepared.env);
    if let Some(ref dir) = prepared.working_dir {
        cmd.current_dir(dir);
    }
    cmd
}

fn spawn_error(prepared: &PreparedLaunch, source: std::io::Error) -> RtboxError {
    // NotFound from the spawn means the loader path itself; anything the
    // loader fails to find is reported by the loader on stderr instead.
    let program = match source.kind() {
        ErrorKind::NotFound | ErrorKind::PermissionDenied => {
            prepared.loader.to_string_lossy().into_owned()
        }
        _ => prepared.argv.join(" "),
    };
    RtboxError::CommandSpawnFailed { program, source }
}

/// Run a command using the glibc from a distro's rootfs, spawn-and-wait.
///
/// Invokes `<loader> --library-path <paths> <command>` with the sanitized
/// environment, blocks until the child exits, and returns its exit code
/// unchanged (128+signal when the child was killed by a signal). The child
/// inherits stdio and the controlling terminal.
pub fn run(config: &Config, request: &ExecutionRequest) -> Result<i32> {
    let prepared = prepare(config, request, &host_env_snapshot())?;

    let status = build_command(&prepared)
        .status()
        .map_err(|e| spawn_error(&prepared, e))?;

    Ok(status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0)))
}

/// Replace the current process with the command, using a distro's glibc.
///
/// Same construction as [`run`], but the calling process image is replaced
/// via `execvp`. On success this never returns; the `Infallible` success
/// type makes that explicit. On failure the process still exists and a
/// structured error describes why the substitution failed.
pub fn exec(config: &Config, request: &ExecutionRequest) -> Result<Infallible> {
    let prepared = prepare(config, request, &host_env_snapshot())?;

    let err = build_command(&prepared).exec();
    Err(spawn_error(&prepared, err))
}

/// Generate a shell wrapper script for a distro.
///
/// The script can be sourced to export the environment, and defines an
/// `rtbox_run` function that re-invokes the loader with the exact
/// `--library-path` construction used by [`run`], so the setup is reusable
/// outside this process. Rendering is deterministic for a given rootfs
/// state.
pub fn wrapper_script(config: &Config, distro_name: &str) -> Result<String> {
    let distro = lookup_distro(distro_name)?;

    if !rootfs::is_installed(config, distro.name) {
        return Err(RtboxError::RootfsNotInstalled {
            distro: distro.name.to_string(),
        });
    }
    let rootfs_path = config.distro_rootfs(distro.name);

    let loader = loader::find_loader(&rootfs_path)?;
    let lib_paths = env::collect_lib_paths(&rootfs_path);
    let lib_path = env::join_lib_paths(&lib_paths, &[]);

    Ok(format!(
        r#"#!/bin/bash
# rtbox wrapper script for {name} (glibc {glibc})
# Source this script or use it as a prefix for commands

export {rootfs_marker}="{rootfs}"
export {distro_marker}="{name}"
export LD_LIBRARY_PATH="{lib_path}"

# Run commands with the rtbox glibc
rtbox_run() {{
    "{loader}" --library-path "$LD_LIBRARY_PATH" "$@"
}}

# If arguments were passed, run them
if [ $# -gt 0 ]; then
    rtbox_run "$@"
fi
"#,
        name = distro.name,
        glibc = distro.glibc_version,
        rootfs_marker = env::ROOTFS_MARKER_ENV,
        rootfs = rootfs_path.display(),
        distro_marker = env::DISTRO_MARKER_ENV,
        lib_path = lib_path,
        loader = loader.display(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_override() {
        let (key, value) = parse_env_override("LD_DEBUG=libs").unwrap();
        assert_eq!(key, "LD_DEBUG");
        assert_eq!(value, "libs");
    }

    #[test]
    fn test_parse_env_override_keeps_later_equals() {
        let (key, value) = parse_env_override("OPTS=a=b").unwrap();
        assert_eq!(key, "OPTS");
        assert_eq!(value, "a=b");
    }

    #[test]
    fn test_parse_env_override_rejects_missing_equals() {
        assert!(matches!(
            parse_env_override("JUSTAKEY"),
            Err(RtboxError::InvalidEnvOverride(_))
        ));
    }

    #[test]
    fn test_parse_env_override_rejects_empty_key() {
        assert!(parse_env_override("=value").is_err());
    }

    #[test]
    fn test_relative_command_passes_through() {
        let resolved = resolve_command(Path::new("/r"), &["ls".to_string()]);
        assert_eq!(resolved, vec!["ls".to_string()]);
    }

    #[test]
    fn test_absolute_command_missing_in_rootfs_unchanged() {
        let resolved = resolve_command(
            Path::new("/nonexistent-rootfs"),
            &["/bin/ls".to_string(), "-a".to_string()],
        );
        assert_eq!(resolved, vec!["/bin/ls".to_string(), "-a".to_string()]);
    }
}
