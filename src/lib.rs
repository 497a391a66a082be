//! rtbox - run binaries with a different glibc version.
//!
//! rtbox runs programs against the glibc shipped inside an extracted distro
//! rootfs instead of the host's, by invoking the rootfs's own dynamic loader
//! with `--library-path`. No containers, no root, no isolation: just loader
//! and library-path plumbing done carefully.

pub mod commands;
pub mod config;
pub mod distro;
pub mod error;
pub mod process;
pub mod rootfs;
pub mod runtime;
