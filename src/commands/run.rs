//! Run and exec commands - launch a program under a distro's glibc.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Result};

use crate::config::Config;
use crate::runtime::{self, ExecutionRequest, SanitizePolicy};

/// Options shared by `run` and `exec`.
pub struct RunOptions {
    /// Distro codename or version number.
    pub distro: String,
    /// Program and arguments.
    pub command: Vec<String>,
    /// Additional library paths (`-L`).
    pub lib_paths: Vec<String>,
    /// `KEY=VALUE` environment overrides (`-e`).
    pub env: Vec<String>,
    /// Working directory (`-C`).
    pub cwd: Option<PathBuf>,
    /// Copy the host environment instead of rebuilding from the allow-list.
    pub keep_host_env: bool,
}

fn build_request(opts: RunOptions) -> Result<ExecutionRequest> {
    let mut overrides = BTreeMap::new();
    for raw in &opts.env {
        let (key, value) = runtime::parse_env_override(raw).map_err(|e| anyhow!("{e}"))?;
        overrides.insert(key, value);
    }

    Ok(ExecutionRequest {
        distro: opts.distro,
        command: opts.command,
        extra_lib_paths: opts.lib_paths,
        working_dir: opts.cwd,
        env_overrides: overrides,
        policy: if opts.keep_host_env {
            SanitizePolicy::KeepHostEnv
        } else {
            SanitizePolicy::CleanEnv
        },
    })
}

/// Execute the run command: spawn-and-wait, returning the child's exit code.
pub fn cmd_run(config: &Config, opts: RunOptions) -> Result<i32> {
    let request = build_request(opts)?;
    let code = runtime::run(config, &request).map_err(|e| anyhow!("{e}"))?;
    Ok(code)
}

/// Execute the exec command: replace this process with the child.
///
/// Only returns on failure; on success the process image is gone.
pub fn cmd_exec(config: &Config, opts: RunOptions) -> Result<()> {
    let request = build_request(opts)?;
    let err = match runtime::exec(config, &request) {
        Err(e) => e,
        // Infallible: exec never returns Ok
        Ok(never) => match never {},
    };
    Err(anyhow!("{err}"))
}
