//! Error types for Horizon MVVM.

/// Errors raised by model mutation, listener binding and serialization.
///
/// Every error is returned synchronously to the immediate caller. Nothing is
/// retried or rolled back internally: operations validate before they mutate,
/// so a returned error means the model was left as it was.
#[derive(Debug, thiserror::Error)]
pub enum MvvmError {
    /// A tag's arity bounds would be violated.
    #[error("tag '{tag}' arity violated: at most {max} item(s), or fewer than its minimum")]
    Capacity {
        /// The tag name.
        tag: String,
        /// The tag's maximum, `usize::MAX` when unbounded.
        max: usize,
    },

    /// A tag, row, property, path or item does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Serialized data describes a different tag or model.
    #[error("schema mismatch: expected '{expected}', found '{found}'")]
    SchemaMismatch {
        /// What the target requires.
        expected: String,
        /// What the data contained.
        found: String,
    },

    /// The target is in the wrong state for the operation.
    #[error("precondition failed: {0}")]
    Precondition(String),

    /// Serialized data is malformed.
    #[error("malformed JSON: {0}")]
    Format(String),

    /// The tag does not accept children of this model type.
    #[error("tag '{tag}' does not accept items of type '{model_type}'")]
    TypeNotAllowed {
        /// The rejected model type.
        model_type: String,
        /// The tag name.
        tag: String,
    },

    /// A property was assigned a value of a different kind.
    #[error("property '{name}' holds {expected}, got {found}")]
    PropertyType {
        /// The property name.
        name: String,
        /// Kind currently stored.
        expected: &'static str,
        /// Kind that was offered.
        found: &'static str,
    },

    /// Document file I/O failed.
    #[error("document I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

impl MvvmError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub(crate) fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }

    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Returns true for [`MvvmError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<serde_json::Error> for MvvmError {
    fn from(err: serde_json::Error) -> Self {
        Self::Format(err.to_string())
    }
}

/// A specialized Result type for Horizon MVVM operations.
pub type Result<T> = std::result::Result<T, MvvmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MvvmError::Capacity {
            tag: "layers".into(),
            max: 2,
        };
        assert!(err.to_string().contains("layers"));

        let err = MvvmError::not_found("property 'min'");
        assert_eq!(err.to_string(), "property 'min' not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: MvvmError = json_err.into();
        assert!(matches!(err, MvvmError::Format(_)));
    }
}
