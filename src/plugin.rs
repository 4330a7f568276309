//! Package metadata and the pinned provider plugin.
//!
//! The engine uses the version and download URL sent with each registration to fetch the exact
//! provider plugin this SDK was generated against.

use lazy_static::lazy_static;
use regex::Regex;

/// The name of the package, as used in type tokens and configuration namespaces.
pub const PACKAGE_NAME: &str = "awstags";

/// The version of the provider plugin this SDK addresses.
pub const PLUGIN_VERSION: &str = "0.0.1-alpha.1723004377+3996998c.dirty";

/// The repository that publishes provider plugin releases.
pub const PLUGIN_REPOSITORY: &str = "https://github.com/nitrictech/pulumi-awstags-native";

/// Descriptive metadata for the package.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PackageMetadata {
    /// A human-readable name.
    pub display_name: &'static str,

    /// A short description of the package.
    pub description: &'static str,

    /// The publisher of the package.
    pub publisher: &'static str,

    /// The package homepage.
    pub homepage: &'static str,

    /// The source repository.
    pub repository: &'static str,

    /// The SPDX license identifier.
    pub license: &'static str,

    /// Search keywords.
    pub keywords: &'static [&'static str],
}

/// Metadata for this package.
pub const METADATA: PackageMetadata = PackageMetadata {
    display_name: "Aws Tags",
    description: "The AWS tags provider enables you to manage tags on already deployed or imported AWS resources.",
    publisher: "Nitric",
    homepage: "https://github.com/nitrictech/pulumi-awstags",
    repository: "https://github.com/nitrictech/pulumi-awstags",
    license: "MIT",
    keywords: &["pulumi", "awstags", "kind/native"],
};

/// The download URL for the plugin release with the given `version`.
#[must_use]
pub fn plugin_download_url(version: &str) -> String {
    format!(
        "{repository}/releases/download/v{version}/pulumi-awstags-v{version}.tgz",
        repository = PLUGIN_REPOSITORY,
        version = version,
    )
}

/// The download URL for the pinned plugin release.
#[must_use]
pub fn default_plugin_download_url() -> String {
    plugin_download_url(PLUGIN_VERSION)
}

/// Whether `version` is a valid semantic version, as required for plugin versions.
#[must_use]
pub fn is_valid_version(version: &str) -> bool {
    lazy_static! {
        static ref SEMVER: Regex = Regex::new(
            r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?(?:\+[0-9A-Za-z-]+(?:\.[0-9A-Za-z-]+)*)?$"
        )
        .unwrap();
    }

    SEMVER.is_match(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_download_url() {
        assert_eq!(
            default_plugin_download_url(),
            "https://github.com/nitrictech/pulumi-awstags-native/releases/download/v0.0.1-alpha.1723004377+3996998c.dirty/pulumi-awstags-v0.0.1-alpha.1723004377+3996998c.dirty.tgz"
        );
    }

    #[test]
    fn metadata_names_the_package() {
        assert!(METADATA.keywords.contains(&PACKAGE_NAME));
        assert!(METADATA.repository.ends_with(PACKAGE_NAME));
        assert_eq!(METADATA.license, "MIT");
    }

    #[test]
    fn versions() {
        assert!(is_valid_version(PLUGIN_VERSION));
        assert!(is_valid_version("1.2.3"));
        assert!(!is_valid_version("v1.2.3"));
        assert!(!is_valid_version("1.2"));
    }
}
