//! Distro definitions and metadata.
//!
//! The catalog is a flat immutable table: the set of Debian releases
//! available as rootfs images from images.linuxcontainers.org, with the
//! glibc version each one ships. glibc versions are taken from the actual
//! LXC images, which may differ slightly from the official Debian package
//! versions.

use serde::Serialize;

/// A Debian distribution supported by rtbox.
#[derive(Debug, Clone, Serialize)]
pub struct Distro {
    /// Codename, e.g. "bookworm".
    pub name: &'static str,
    /// Release version, e.g. "12".
    pub version: &'static str,
    /// glibc version shipped in the image, e.g. "2.36".
    pub glibc_version: &'static str,
    /// Debian codename (same as `name` for Debian releases).
    pub codename: &'static str,
}

/// All supported distributions, oldest first.
pub const DISTROS: &[Distro] = &[
    Distro {
        name: "bullseye",
        version: "11",
        glibc_version: "2.30",
        codename: "bullseye",
    },
    Distro {
        name: "bookworm",
        version: "12",
        glibc_version: "2.36",
        codename: "bookworm",
    },
    Distro {
        name: "trixie",
        version: "13",
        glibc_version: "2.41",
        codename: "trixie",
    },
    Distro {
        name: "forky",
        version: "14",
        glibc_version: "2.41",
        codename: "forky",
    },
];

/// Look up a distro by codename or release version number.
pub fn get(name: &str) -> Option<&'static Distro> {
    DISTROS
        .iter()
        .find(|d| d.name == name || d.version == name)
}

/// All available distros, in declaration order.
pub fn all() -> &'static [Distro] {
    DISTROS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_codename() {
        let distro = get("bookworm").unwrap();
        assert_eq!(distro.version, "12");
        assert_eq!(distro.glibc_version, "2.36");
    }

    #[test]
    fn test_lookup_by_version() {
        let distro = get("12").unwrap();
        assert_eq!(distro.name, "bookworm");
    }

    #[test]
    fn test_unknown_name() {
        assert!(get("sarge").is_none());
    }

    #[test]
    fn test_catalog_has_all_releases() {
        assert!(all().len() >= 4);
    }
}
