//! Deploy manifest parsing and resource key derivation
//!
//! Each deployment ships a manifest mapping logical resource paths to
//! content fingerprints, plus the shell set that must be staged before the
//! cache is usable offline. The manifest is immutable for the lifetime of a
//! deployment; upgrades are detected by comparing fingerprints against the
//! previously persisted snapshot.

use crate::error::{PrecacheError, PrecacheResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Sentinel key for the origin root (the entry page)
pub const ROOT_KEY: &str = "/";

/// An opaque content fingerprint
///
/// Produced by the build pipeline; precache never computes one, it only
/// compares them for equality across deployments.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Fingerprint {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Fingerprint {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One deployment's resource table: logical path → fingerprint
///
/// Read-only after construction. The snapshot persisted at the end of a
/// successful reconciliation is exactly the JSON serialization of this map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    resources: BTreeMap<String, Fingerprint>,
}

impl Manifest {
    pub fn from_resources(resources: BTreeMap<String, Fingerprint>) -> Self {
        Self { resources }
    }

    /// Look up the fingerprint for a resource path
    pub fn fingerprint(&self, path: &str) -> Option<&Fingerprint> {
        self.resources.get(path)
    }

    /// Whether the manifest tracks the given path
    pub fn contains(&self, path: &str) -> bool {
        self.resources.contains_key(path)
    }

    /// Iterate over all tracked paths
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Serialize to the snapshot body stored in the manifest store
    pub fn to_snapshot_json(&self) -> PrecacheResult<Vec<u8>> {
        Ok(serde_json::to_vec(&self.resources)?)
    }

    /// Parse a snapshot body written by a previous reconciliation
    pub fn from_snapshot_json(bytes: &[u8]) -> PrecacheResult<Self> {
        let resources: BTreeMap<String, Fingerprint> = serde_json::from_slice(bytes)?;
        Ok(Self { resources })
    }
}

/// The deploy manifest artifact produced by the build step
///
/// Carries the resource table plus the ordered shell set. Every shell path
/// must appear in the resource table.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployManifest {
    resources: BTreeMap<String, Fingerprint>,
    shell: Vec<String>,
}

impl DeployManifest {
    /// Parse a deploy manifest from a JSON string
    pub fn parse(content: &str) -> PrecacheResult<Self> {
        let deploy: DeployManifest =
            serde_json::from_str(content).map_err(|e| PrecacheError::ManifestInvalid {
                reason: e.to_string(),
            })?;
        deploy.validate()?;
        Ok(deploy)
    }

    /// Load and parse a deploy manifest from a file on disk
    pub async fn from_file(path: &Path) -> PrecacheResult<Self> {
        if !path.exists() {
            return Err(PrecacheError::ManifestNotFound(path.to_path_buf()));
        }
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| PrecacheError::io(format!("reading deploy manifest {}", path.display()), e))?;
        Self::parse(&content)
    }

    fn validate(&self) -> PrecacheResult<()> {
        for path in &self.shell {
            if !self.resources.contains_key(path) {
                return Err(PrecacheError::ManifestInvalid {
                    reason: format!("shell path {path:?} is not in the resource table"),
                });
            }
        }
        Ok(())
    }

    /// The ordered shell set
    pub fn shell(&self) -> &[String] {
        &self.shell
    }

    /// Split into the immutable manifest and the shell set
    pub fn into_parts(self) -> (Manifest, Vec<String>) {
        (Manifest::from_resources(self.resources), self.shell)
    }
}

/// Derive the logical resource key for a request URL
///
/// Returns `None` when the URL does not belong to `origin` (the signal that
/// the request is not a tracked asset and must pass through). The origin is
/// passed explicitly; it must not carry a trailing slash.
///
/// Normalization: the origin prefix and its following slash are stripped, a
/// `?v=` cache-busting suffix is dropped, and the bare origin, a
/// fragment-only remainder, or an empty remainder all resolve to [`ROOT_KEY`].
pub fn resource_key(origin: &str, url: &str) -> Option<String> {
    if url == origin {
        return Some(ROOT_KEY.to_string());
    }
    let rest = url
        .strip_prefix(origin)
        .and_then(|r| r.strip_prefix('/'))?;
    if rest.starts_with('#') {
        return Some(ROOT_KEY.to_string());
    }
    let rest = match rest.find("?v=") {
        Some(idx) => &rest[..idx],
        None => rest,
    };
    if rest.is_empty() {
        return Some(ROOT_KEY.to_string());
    }
    Some(rest.to_string())
}

/// The canonical URL a resource key is stored under
///
/// Inverse of [`resource_key`] for canonical keys: the root maps to
/// `origin/`, everything else to `origin/<key>`.
pub fn canonical_url(origin: &str, key: &str) -> String {
    if key == ROOT_KEY {
        format!("{origin}/")
    } else {
        format!("{origin}/{key}")
    }
}
