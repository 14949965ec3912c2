//! Error types for path compilation and transaction execution.

use thiserror::Error;

/// Result type for path operations.
pub type Result<T> = std::result::Result<T, PathError>;

/// Errors that can occur while compiling paths or executing a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// The path string violates the path grammar.
    #[error("Malformed path '{path}': {reason} at '{fragment}'")]
    MalformedPath {
        path: String,
        fragment: String,
        reason: String,
    },

    /// A template referenced `%N` beyond the captures its match produced.
    #[error("Template '{template}' references capture %{index} but only {available} were captured")]
    TemplateCaptureOutOfRange {
        template: String,
        index: usize,
        available: usize,
    },

    /// A template used `%%` with no recursive-descent splat left to expand.
    #[error("Template '{template}' expands %% but the match has no unconsumed splat")]
    UnknownSplat { template: String },

    /// `execute` was called on a bare scalar.
    #[error("Cannot run a path transaction on a {found} root")]
    UnsupportedRootShape { found: String },
}

impl PathError {
    pub(crate) fn malformed(path: &str, fragment: &str, reason: &str) -> Self {
        PathError::MalformedPath {
            path: path.to_string(),
            fragment: fragment.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Re-targets a `MalformedPath` raised for one segment at the full path string.
    pub(crate) fn in_path(self, full: &str) -> Self {
        match self {
            PathError::MalformedPath {
                fragment, reason, ..
            } => PathError::MalformedPath {
                path: full.to_string(),
                fragment,
                reason,
            },
            other => other,
        }
    }

    /// Returns `true` for errors that degrade a transaction instead of failing it.
    pub fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            PathError::TemplateCaptureOutOfRange { .. } | PathError::UnknownSplat { .. }
        )
    }
}
