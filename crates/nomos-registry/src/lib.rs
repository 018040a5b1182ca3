//! # nomos-registry
//!
//! Identity and persistence types shared by the provider engine: the
//! `(type, version, os, arch)` tuple, platform detection and asset-name
//! matching, the `.nomos/` cache layout, the lockfile schema with atomic
//! writes, the provider type registry, and the `Provider` trait the
//! evaluator consumes.

pub mod checksum;
pub mod error;
pub mod identity;
pub mod lockfile;
pub mod paths;
pub mod platform;
pub mod provider;
pub mod registry;
pub mod version;

pub use checksum::{bytes_sha256, file_sha256};
pub use error::{Error, Result};
pub use identity::{is_downloadable_type, ProviderIdentity};
pub use lockfile::{
    GithubSource, LockedProvider, Lockfile, SourceMetadata, LOCKFILE_SCHEMA_VERSION,
};
pub use paths::{CacheLayout, CACHE_DIR_NAME, LOCKFILE_NAME, STAGING_DIR_NAME};
pub use platform::{Arch, Os, Platform};
pub use provider::{Provider, ProviderError};
pub use registry::{BuiltinFactory, ProviderTypeRegistry, ResolvedType};
pub use version::{candidate_tags, validate_version};
