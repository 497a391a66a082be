//! Dynamic loader resolution inside a rootfs.
//!
//! The chosen file must be the rootfs's own ld-linux, never a symlink that
//! resolves back to the host. Absolute symlink targets are resolved against
//! the real filesystem root, not the rootfs, so any candidate whose link
//! target starts with `/` is rejected outright.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Result, RtboxError};

/// Canonical loader locations, relative to the rootfs root.
///
/// Arch-specific triplet paths come first: `lib64` frequently holds an
/// absolute-target symlink while the triplet directory holds the real file.
const LOADER_CANDIDATES: &[&str] = &[
    // x86_64 - check the actual lib path first, not the lib64 symlink
    "lib/x86_64-linux-gnu/ld-linux-x86-64.so.2",
    "lib64/ld-linux-x86-64.so.2",
    // aarch64
    "lib/aarch64-linux-gnu/ld-linux-aarch64.so.1",
    "lib/ld-linux-aarch64.so.1",
    // Generic
    "lib/ld-linux.so.2",
];

/// True if the path is a symlink whose stored target is absolute.
fn is_absolute_symlink(path: &Path) -> bool {
    match path.symlink_metadata() {
        Ok(meta) if meta.file_type().is_symlink() => match fs::read_link(path) {
            Ok(target) => target.is_absolute(),
            Err(_) => true,
        },
        _ => false,
    }
}

/// Loader filename pattern: `ld-linux*.so*`.
fn is_loader_name(name: &str) -> bool {
    name.starts_with("ld-linux") && name.contains(".so")
}

/// Files matching the loader pattern directly inside `dir`, sorted by name.
fn loader_files_in(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut matches: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .filter(|e| is_loader_name(&e.file_name().to_string_lossy()))
        .filter(|e| !e.path().is_dir())
        .map(|e| e.path())
        .collect();
    matches.sort();
    matches
}

/// Pick the best loader among glob matches for one pattern.
///
/// Absolute symlinks are dropped; among the survivors, filenames carrying a
/// versioned suffix (`.so.1`/`.so.2`) win, otherwise the first match is
/// taken.
fn pick_from_matches(matches: &[PathBuf]) -> Option<PathBuf> {
    let survivors: Vec<&PathBuf> = matches
        .iter()
        .filter(|m| !is_absolute_symlink(m))
        .collect();

    survivors
        .iter()
        .find(|m| {
            let name = m.file_name().map(|n| n.to_string_lossy().into_owned());
            name.map(|n| n.contains(".so.2") || n.contains(".so.1"))
                .unwrap_or(false)
        })
        .or_else(|| survivors.first())
        .map(|p| (*p).clone())
}

/// Find the ld-linux dynamic loader in a rootfs.
///
/// Probes the canonical candidate list first, then falls back to a glob-style
/// search under `lib/*/` and `lib*/`. Returns `LoaderNotFound` carrying every
/// probed location when nothing usable exists.
pub fn find_loader(rootfs: &Path) -> Result<PathBuf> {
    let mut tried = Vec::new();

    for rel in LOADER_CANDIDATES {
        let candidate = rootfs.join(rel);
        tried.push(candidate.clone());
        if !candidate.exists() {
            continue;
        }
        // Absolute symlink - skip it, it would resolve to the host
        if is_absolute_symlink(&candidate) {
            continue;
        }
        return Ok(candidate);
    }

    // Fallback: lib/*/ld-linux*.so* then lib*/ld-linux*.so*
    let mut triplet_dirs = Vec::new();
    if let Ok(entries) = fs::read_dir(rootfs.join("lib")) {
        triplet_dirs = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        triplet_dirs.sort();
    }
    let mut lib_dirs = Vec::new();
    if let Ok(entries) = fs::read_dir(rootfs) {
        lib_dirs = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().starts_with("lib"))
            .map(|e| e.path())
            .filter(|p| p.is_dir())
            .collect();
        lib_dirs.sort();
    }

    for dirs in [triplet_dirs, lib_dirs] {
        let mut matches = Vec::new();
        for dir in dirs {
            matches.extend(loader_files_in(&dir));
        }
        tried.extend(matches.iter().cloned());
        if let Some(found) = pick_from_matches(&matches) {
            return Ok(found);
        }
    }

    Err(RtboxError::LoaderNotFound {
        rootfs: rootfs.to_path_buf(),
        tried,
    })
}
