//! Tests for rootfs install-status probing, info gathering and glibc
//! detection against synthetic trees.

mod helpers;

use std::fs;

use helpers::TestEnv;
use rtbox::rootfs;

#[test]
fn test_not_installed_when_directory_missing() {
    let env = TestEnv::new();
    assert!(!rootfs::is_installed(&env.config, "bookworm"));
}

#[test]
fn test_not_installed_when_directory_empty() {
    let env = TestEnv::new();
    env.create_rootfs_dir("bookworm");
    assert!(!rootfs::is_installed(&env.config, "bookworm"));
}

#[test]
fn test_installed_with_lib_dir() {
    let env = TestEnv::new();
    let rootfs_path = env.create_rootfs_dir("bookworm");
    fs::create_dir_all(rootfs_path.join("lib")).unwrap();
    assert!(rootfs::is_installed(&env.config, "bookworm"));
}

#[test]
fn test_installed_with_only_lib64_dir() {
    let env = TestEnv::new();
    let rootfs_path = env.create_rootfs_dir("bookworm");
    fs::create_dir_all(rootfs_path.join("lib64")).unwrap();
    assert!(rootfs::is_installed(&env.config, "bookworm"));
}

#[test]
fn test_installed_distros_filters_catalog() {
    let env = TestEnv::new();
    env.create_mock_rootfs("bookworm");
    env.create_mock_rootfs("trixie");
    // Incomplete tree does not count as installed.
    env.create_rootfs_dir("bullseye");

    let installed: Vec<&str> = rootfs::installed_distros(&env.config)
        .iter()
        .map(|d| d.name)
        .collect();
    assert_eq!(installed, vec!["bookworm", "trixie"]);
}

#[test]
fn test_remove_reports_missing() {
    let env = TestEnv::new();
    assert!(!rootfs::remove(&env.config, "bookworm").unwrap());
}

#[test]
fn test_remove_deletes_tree() {
    let env = TestEnv::new();
    let rootfs_path = env.create_mock_rootfs("bookworm");

    assert!(rootfs::remove(&env.config, "bookworm").unwrap());
    assert!(!rootfs_path.exists());
    assert!(!rootfs::is_installed(&env.config, "bookworm"));
}

#[test]
fn test_info_none_when_not_installed() {
    let env = TestEnv::new();
    assert!(rootfs::info(&env.config, "bookworm").unwrap().is_none());
}

#[test]
fn test_info_unknown_distro_is_error() {
    let env = TestEnv::new();
    assert!(rootfs::info(&env.config, "sarge").is_err());
}

#[test]
fn test_info_reports_size_and_catalog_glibc_fallback() {
    let env = TestEnv::new();
    let rootfs_path = env.create_mock_rootfs("bookworm");

    let info = rootfs::info(&env.config, "bookworm").unwrap().unwrap();
    assert_eq!(info.name, "bookworm");
    assert_eq!(info.version, "12");
    assert_eq!(info.path, rootfs_path);
    assert!(info.size_mb > 0.0);
    // No libc.so.6 in the mock tree: catalog value is used.
    assert_eq!(info.glibc_version, "2.36");
}

#[test]
fn test_detect_glibc_version_from_libc_banner() {
    let env = TestEnv::new();
    let rootfs_path = env.create_mock_rootfs("bookworm");

    fs::write(
        rootfs_path.join("lib/x86_64-linux-gnu/libc.so.6"),
        b"\x7fELF...GNU C Library (Debian GLIBC 2.41-6) stable release version 2.41.\x00...",
    )
    .unwrap();

    assert_eq!(
        rootfs::detect_glibc_version(&rootfs_path).unwrap(),
        "2.41"
    );

    // info prefers the detected version over the catalog's.
    let info = rootfs::info(&env.config, "bookworm").unwrap().unwrap();
    assert_eq!(info.glibc_version, "2.41");
}

#[test]
fn test_detect_glibc_version_absent() {
    let env = TestEnv::new();
    let rootfs_path = env.create_mock_rootfs("bookworm");
    assert!(rootfs::detect_glibc_version(&rootfs_path).is_none());
}
