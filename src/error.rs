//! Error types for precache
//!
//! All modules use `PrecacheResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for precache operations
pub type PrecacheResult<T> = Result<T, PrecacheError>;

/// All errors that can occur in precache
#[derive(Error, Debug)]
pub enum PrecacheError {
    // Network errors
    #[error("Fetch failed for {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Fetch for {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // Lifecycle errors
    #[error("Shell prefetch failed for {path}")]
    ShellPrefetch {
        path: String,
        #[source]
        source: Box<PrecacheError>,
    },

    #[error("Cache upgrade failed")]
    Upgrade {
        #[source]
        source: Box<PrecacheError>,
    },

    // Manifest errors
    #[error("Invalid deploy manifest: {reason}")]
    ManifestInvalid { reason: String },

    #[error("Deploy manifest not found: {0}")]
    ManifestNotFound(PathBuf),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("No origin configured")]
    OriginNotConfigured,

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl PrecacheError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a fetch transport error
    pub fn fetch(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Fetch {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Wrap a reconciliation fault as an upgrade failure
    pub fn upgrade(source: PrecacheError) -> Self {
        Self::Upgrade {
            source: Box::new(source),
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            Self::ShellPrefetch { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::OriginNotConfigured => Some("Run: precache init"),
            Self::Upgrade { .. } => {
                Some("Local caches were reset to a clean state. Run: precache sync")
            }
            _ => None,
        }
    }
}
