//! Error types for arbor.
//!
//! This module provides comprehensive error handling following the thiserror pattern.
//! Errors fall into three families: validation errors (user input, always
//! recoverable), collaborator errors (tree store, generation engine, filesystem),
//! and invariant violations (programming errors that halt the current action).

use thiserror::Error;

/// Primary error type for arbor operations.
#[derive(Error, Debug)]
pub enum ArborError {
    /// User input failed validation.
    #[error("{message}")]
    Validation {
        /// Human-readable error message, shown verbatim in the status line.
        message: String,
    },

    /// Node not found in the tree store.
    #[error("Node not found: {id}")]
    NodeNotFound {
        /// Node ID that was not found.
        id: String,
    },

    /// Generation request failed.
    #[error("Generation failed: {message}")]
    Generation {
        /// Human-readable error message.
        message: String,
        /// Underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Provider referenced by a tree is not configured.
    #[error("Provider not configured: {name}")]
    ProviderNotConfigured {
        /// Provider name as recorded in the tree config.
        name: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable error message.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {context}")]
    IoError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Serialization error.
    #[error("Serialization error: {context}")]
    SerializationError {
        /// Context describing the operation that failed.
        context: String,
        /// Underlying serde_json error.
        #[source]
        source: serde_json::Error,
    },

    /// Internal invariant violated.
    #[error("Internal error: {message}")]
    Invariant {
        /// Description of the violated invariant.
        message: String,
    },

    /// Unsupported operation or environment.
    #[error("Unsupported: {feature}")]
    Unsupported {
        /// Name of the unsupported feature.
        feature: String,
    },
}

impl ArborError {
    /// Create a new validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new I/O error with context.
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            context: context.into(),
            source,
        }
    }

    /// Create a new generation error.
    #[must_use]
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
            source: None,
        }
    }

    /// Create a new generation error with source.
    #[must_use]
    pub fn generation_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generation {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new invariant violation error.
    #[must_use]
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant {
            message: message.into(),
        }
    }

    /// Create a new unsupported error.
    #[must_use]
    pub fn unsupported(feature: impl Into<String>) -> Self {
        Self::Unsupported {
            feature: feature.into(),
        }
    }

    /// Get the exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation { .. } => 2,
            Self::NodeNotFound { .. } => 3,
            Self::InvalidConfig { .. } | Self::ProviderNotConfigured { .. } => 5,
            Self::Generation { .. } => 6,
            Self::Invariant { .. } => 70,
            Self::IoError { .. } => 74,
            _ => 1,
        }
    }

    /// Check if this error came from user input rather than a collaborator.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Format the source chain for detailed display.
    ///
    /// Returns `None` when the error has no underlying cause.
    #[must_use]
    pub fn source_chain(&self) -> Option<String> {
        let mut parts = Vec::new();
        let mut current = std::error::Error::source(self);
        while let Some(err) = current {
            parts.push(err.to_string());
            current = err.source();
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(": "))
        }
    }
}

/// Result type alias for arbor operations.
pub type Result<T> = std::result::Result<T, ArborError>;

impl From<std::io::Error> for ArborError {
    fn from(err: std::io::Error) -> Self {
        Self::IoError {
            context: "I/O operation failed".to_string(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for ArborError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            context: "JSON operation failed".to_string(),
            source: err,
        }
    }
}

/// Exit codes for CLI operations.
pub mod exit_codes {
    /// Operation completed successfully.
    pub const EXIT_SUCCESS: i32 = 0;
    /// General/unspecified error.
    pub const EXIT_GENERAL_ERROR: i32 = 1;
    /// Input validation failed.
    pub const EXIT_VALIDATION_ERROR: i32 = 2;
    /// Specified node not found.
    pub const EXIT_NOT_FOUND: i32 = 3;
    /// Invalid configuration.
    pub const EXIT_CONFIG_ERROR: i32 = 5;
    /// Generation request failed.
    pub const EXIT_GENERATION_ERROR: i32 = 6;
    /// Internal invariant violated (BSD EX_SOFTWARE).
    pub const EXIT_INTERNAL_ERROR: i32 = 70;
    /// I/O error (BSD standard).
    pub const EXIT_IO_ERROR: i32 = 74;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let validation = ArborError::validation("empty title");
        assert_eq!(validation.exit_code(), 2);

        let not_found = ArborError::NodeNotFound {
            id: "missing".to_string(),
        };
        assert_eq!(not_found.exit_code(), 3);

        let invariant = ArborError::invariant("window capacity is zero");
        assert_eq!(invariant.exit_code(), 70);
    }

    #[test]
    fn test_validation_display_is_bare_message() {
        let err = ArborError::validation("Unknown command: /frob");
        assert_eq!(err.to_string(), "Unknown command: /frob");
        assert!(err.is_validation());
    }

    #[test]
    fn test_source_chain() {
        let io = std::io::Error::other("disk full");
        let err = ArborError::io("writing bookmarks", io);
        assert_eq!(err.source_chain().as_deref(), Some("disk full"));

        let bare = ArborError::validation("nope");
        assert!(bare.source_chain().is_none());
    }
}
