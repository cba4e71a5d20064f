//! Error types for warpio-hooks
//!
//! Domain-specific error enums using thiserror. Every one of these collapses
//! to an approve response at the handler boundary; the types exist so callers
//! and tests can distinguish "no data available" from an unexpected fault.

/// The incoming event envelope could not be decoded.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EnvelopeError {
    #[error("JSON decode: {0}")]
    Json(String),
    #[error("I/O reading envelope: {0}")]
    Io(String),
}

/// The durable log could not accept a record.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("no writable log directory among candidates")]
    NoWritableDir,
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A checkpoint or summary artifact could not be written.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

impl ArtifactError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        ArtifactError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
