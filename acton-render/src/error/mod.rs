//! Error types and error handling
//!
//! Every failure in the render pipeline surfaces as a [`RenderError`]. None of
//! them are retried; HTTP-facing helpers turn them into a plain-text
//! `500 Internal Server Error` carrying the error text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::path::PathBuf;
use thiserror::Error;

/// Result alias used throughout the crate
pub type RenderResult<T> = Result<T, RenderError>;

/// Render pipeline error
#[derive(Debug, Error)]
pub enum RenderError {
    /// Template name could not be normalized into a filesystem path
    #[error("invalid template path '{name}': {reason}")]
    Path {
        /// The logical name that failed to resolve
        name: String,
        /// Why it could not be resolved
        reason: String,
    },

    /// Template or partial file is missing or unreadable
    #[error("{}: {source}", .path.display())]
    Io {
        /// The offending file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The template engine rejected a file's syntax
    #[error("failed to parse template '{name}': {source}")]
    Parse {
        /// Name the template was registered under
        name: String,
        /// Engine error
        #[source]
        source: minijinja::Error,
    },

    /// Runtime failure while substituting the model into a template
    #[error("failed to execute template '{name}': {source}")]
    Execution {
        /// Entry point that was executing
        name: String,
        /// Engine error
        #[source]
        source: minijinja::Error,
    },

    /// A layout `extends` chain loops back onto itself
    #[error("cyclic layout chain: {}", format_chain(.chain))]
    CyclicLayout {
        /// Files visited, ending with the one that closed the loop
        chain: Vec<PathBuf>,
    },

    /// JSON or XML serialization failed
    #[error("failed to encode {format}: {reason}")]
    Encode {
        /// `json`, `xml` or `header`
        format: &'static str,
        /// Codec error text
        reason: String,
    },
}

impl RenderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn path(name: &str, reason: impl Into<String>) -> Self {
        Self::Path {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from a missing or unreadable file
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

impl From<serde_json::Error> for RenderError {
    fn from(err: serde_json::Error) -> Self {
        Self::Encode {
            format: "json",
            reason: err.to_string(),
        }
    }
}

impl From<quick_xml::DeError> for RenderError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::Encode {
            format: "xml",
            reason: err.to_string(),
        }
    }
}

impl IntoResponse for RenderError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, format!("{self}\n")).into_response()
    }
}
