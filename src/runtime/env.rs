//! Library path collection and environment sanitization.
//!
//! Forwarding host loader/malloc tunables into a process running under a
//! different glibc is a primary cause of crashes that look like memory
//! corruption ("stack smashing detected"), because tunable formats differ
//! across glibc releases. The default policy therefore rebuilds the child
//! environment from an allow-list instead of copying the host environment.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable exposing the resolved rootfs path to the child.
pub const ROOTFS_MARKER_ENV: &str = "RTBOX_ROOTFS";

/// Environment variable exposing the distro name (wrapper script only).
pub const DISTRO_MARKER_ENV: &str = "RTBOX_DISTRO";

/// Conventional library directories, relative to the rootfs root.
///
/// Order is significant: it becomes the child loader's search priority.
const LIB_DIR_CANDIDATES: &[&str] = &[
    "lib",
    "lib64",
    "lib/x86_64-linux-gnu",
    "lib/aarch64-linux-gnu",
    "usr/lib",
    "usr/lib64",
    "usr/lib/x86_64-linux-gnu",
    "usr/lib/aarch64-linux-gnu",
];

/// Host variables safe to pass through under the clean-environment policy.
///
/// Terminal/session, locale, display, SSH agent, temp dirs, CI markers.
const SAFE_HOST_VARS: &[&str] = &[
    "PATH",
    "HOME",
    "USER",
    "LOGNAME",
    "SHELL",
    "TERM",
    "COLORTERM",
    "LANG",
    "LC_ALL",
    "LC_CTYPE",
    "TZ",
    "DISPLAY",
    "WAYLAND_DISPLAY",
    "XDG_RUNTIME_DIR",
    "XDG_SESSION_TYPE",
    "DBUS_SESSION_BUS_ADDRESS",
    "SSH_AUTH_SOCK",
    "SSH_TTY",
    "TMPDIR",
    "TEMP",
    "TMP",
    // CI/CD variables
    "CI",
    "GITHUB_ACTIONS",
    "RUNNER_OS",
];

/// Host variables stripped under the keep-host-env policy.
///
/// Loader tuning, preload/audit lists and malloc tunables from the host
/// glibc must never reach a child bound to a different glibc.
const UNSAFE_HOST_VARS: &[&str] = &[
    "LD_LIBRARY_PATH",
    "LD_PRELOAD",
    "LD_AUDIT",
    "LD_DEBUG",
    "LD_DEBUG_OUTPUT",
    "LD_ASSUME_KERNEL",
    "LD_BIND_NOW",
    "LD_BIND_NOT",
    "LD_DYNAMIC_WEAK",
    "LD_HWCAP_MASK",
    "LD_ORIGIN_PATH",
    "LD_PROFILE",
    "LD_SHOW_AUXV",
    "MALLOC_ARENA_MAX",
    "MALLOC_ARENA_TEST",
    "MALLOC_CHECK_",
    "MALLOC_MMAP_MAX_",
    "MALLOC_MMAP_THRESHOLD_",
    "MALLOC_PERTURB_",
    "MALLOC_TOP_PAD_",
    "MALLOC_TRIM_THRESHOLD_",
    "GLIBC_TUNABLES",
];

/// How the child environment is derived from the host environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizePolicy {
    /// Rebuild from an allow-list of safe host variables (default).
    #[default]
    CleanEnv,
    /// Copy the full host environment minus known-bad loader/malloc
    /// tunables. The launcher additionally passes `--inhibit-rpath ""` so
    /// embedded run-time search paths cannot pull in host libraries.
    KeepHostEnv,
}

/// Get all library paths present in the rootfs, in fixed priority order.
pub fn collect_lib_paths(rootfs: &Path) -> Vec<PathBuf> {
    LIB_DIR_CANDIDATES
        .iter()
        .map(|rel| rootfs.join(rel))
        .filter(|p| p.is_dir())
        .collect()
}

/// Colon-join rootfs library paths followed by caller-supplied extras.
pub fn join_lib_paths(lib_paths: &[PathBuf], extra_lib_paths: &[String]) -> String {
    let mut parts: Vec<String> = lib_paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    parts.extend(extra_lib_paths.iter().cloned());
    parts.join(":")
}

/// Build the child environment for running under a different glibc.
///
/// The host environment is passed in explicitly so the result is a pure
/// function of its inputs. Precedence, lowest to highest: policy-filtered
/// host variables, the computed `LD_LIBRARY_PATH` and rootfs marker, then
/// caller overrides — explicit user intent wins even over the sanitization
/// policy.
pub fn build_env(
    rootfs: &Path,
    host_env: &BTreeMap<String, String>,
    lib_paths: &[PathBuf],
    extra_lib_paths: &[String],
    overrides: &BTreeMap<String, String>,
    policy: SanitizePolicy,
) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    match policy {
        SanitizePolicy::CleanEnv => {
            for var in SAFE_HOST_VARS {
                if let Some(value) = host_env.get(*var) {
                    env.insert((*var).to_string(), value.clone());
                }
            }
        }
        SanitizePolicy::KeepHostEnv => {
            for (key, value) in host_env {
                if !UNSAFE_HOST_VARS.contains(&key.as_str()) {
                    env.insert(key.clone(), value.clone());
                }
            }
        }
    }

    env.insert(
        "LD_LIBRARY_PATH".to_string(),
        join_lib_paths(lib_paths, extra_lib_paths),
    );
    env.insert(
        ROOTFS_MARKER_ENV.to_string(),
        rootfs.to_string_lossy().into_owned(),
    );

    for (key, value) in overrides {
        env.insert(key.clone(), value.clone());
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host_env(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_clean_env_drops_loader_tuning() {
        let host = host_env(&[
            ("PATH", "/usr/bin"),
            ("LD_PRELOAD", "/tmp/evil.so"),
            ("GLIBC_TUNABLES", "glibc.malloc.check=3"),
        ]);
        let env = build_env(
            Path::new("/r"),
            &host,
            &[],
            &[],
            &BTreeMap::new(),
            SanitizePolicy::CleanEnv,
        );

        assert_eq!(env.get("PATH").unwrap(), "/usr/bin");
        assert!(!env.contains_key("LD_PRELOAD"));
        assert!(!env.contains_key("GLIBC_TUNABLES"));
    }

    #[test]
    fn test_keep_host_env_drops_only_deny_list() {
        let host = host_env(&[
            ("PATH", "/usr/bin"),
            ("MY_APP_SETTING", "yes"),
            ("LD_PRELOAD", "/tmp/evil.so"),
            ("MALLOC_CHECK_", "3"),
        ]);
        let env = build_env(
            Path::new("/r"),
            &host,
            &[],
            &[],
            &BTreeMap::new(),
            SanitizePolicy::KeepHostEnv,
        );

        assert_eq!(env.get("MY_APP_SETTING").unwrap(), "yes");
        assert!(!env.contains_key("LD_PRELOAD"));
        assert!(!env.contains_key("MALLOC_CHECK_"));
    }

    #[test]
    fn test_overrides_win_over_exclusions() {
        let host = host_env(&[("LD_PRELOAD", "/host.so")]);
        let mut overrides = BTreeMap::new();
        overrides.insert("LD_PRELOAD".to_string(), "/mine.so".to_string());

        let env = build_env(
            Path::new("/r"),
            &host,
            &[],
            &[],
            &overrides,
            SanitizePolicy::CleanEnv,
        );

        assert_eq!(env.get("LD_PRELOAD").unwrap(), "/mine.so");
    }

    #[test]
    fn test_lib_path_join_order() {
        let libs = vec![PathBuf::from("/r/lib"), PathBuf::from("/r/usr/lib")];
        let extra = vec!["/opt/mylibs".to_string()];
        assert_eq!(join_lib_paths(&libs, &extra), "/r/lib:/r/usr/lib:/opt/mylibs");
    }

    #[test]
    fn test_rootfs_marker_set() {
        let env = build_env(
            Path::new("/srv/rootfs/bookworm"),
            &BTreeMap::new(),
            &[],
            &[],
            &BTreeMap::new(),
            SanitizePolicy::CleanEnv,
        );
        assert_eq!(env.get(ROOTFS_MARKER_ENV).unwrap(), "/srv/rootfs/bookworm");
    }
}
