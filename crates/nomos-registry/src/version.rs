//! Declared-version validation

use semver::Version;

use crate::error::{Error, Result};

/// Validate a declared provider version.
///
/// An empty version is legal (meaning "latest"); anything else must parse
/// as a semantic version.
pub fn validate_version(source_type: &str, version: &str) -> Result<()> {
    if version.is_empty() {
        return Ok(());
    }
    Version::parse(version).map_err(|_| Error::InvalidVersion {
        source_type: source_type.to_string(),
        version: version.to_string(),
    })?;
    Ok(())
}

/// The release tags a declared version may live under, in lookup order.
pub fn candidate_tags(version: &str) -> Vec<String> {
    vec![format!("v{version}"), version.to_string()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_version_is_latest() {
        assert!(validate_version("a/b", "").is_ok());
    }

    #[test]
    fn valid_semver_passes() {
        assert!(validate_version("a/b", "1.2.3").is_ok());
        assert!(validate_version("a/b", "0.1.0-rc.1").is_ok());
    }

    #[test]
    fn invalid_semver_names_the_type() {
        let err = validate_version("acme/vault", "not-a-version").unwrap_err();
        assert!(err.to_string().contains("acme/vault"));
        assert!(err.to_string().contains("not-a-version"));
    }

    #[test]
    fn tag_candidates_prefer_v_prefix() {
        assert_eq!(candidate_tags("1.2.3"), vec!["v1.2.3", "1.2.3"]);
    }
}
