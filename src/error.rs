//! Error types for wfs20
//!
//! Mutating a record never fails; errors come from parsing lexical values,
//! index-based list operations, duplicate values in unique lists,
//! reference resolution, validation against schema cardinalities and
//! XML encoding.

use std::fmt;
use thiserror::Error;

/// Result type alias using wfs20 Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for wfs20 operations
#[derive(Error, Debug)]
pub enum Error {
    /// Record content does not satisfy the schema
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Value error (invalid lexical value for a type)
    #[error("value error: {0}")]
    Value(String),

    /// Name error (invalid XML name)
    #[error("name error: {0}")]
    Name(String),

    /// Namespace error
    #[error("namespace error: {0}")]
    Namespace(String),

    /// Duplicate value rejected by a unique list
    #[error("duplicate value: {0}")]
    Duplicate(String),

    /// Index out of range for a list operation
    #[error("index {index} out of range for length {len}")]
    Index {
        /// Requested index
        index: usize,
        /// Length of the list at the time of the call
        len: usize,
    },

    /// A reference could not be resolved
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Encoding error (record to XML conversion)
    #[error("encoding error: {0}")]
    Encode(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Build an index error
    pub fn index(index: usize, len: usize) -> Self {
        Error::Index { index, len }
    }
}

/// Schema validation error with context
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Error message
    pub message: String,
    /// Path to the record field that failed validation
    pub path: Option<String>,
    /// Name of the record type
    pub type_name: Option<String>,
    /// Original reason
    pub reason: Option<String>,
}

impl ValidationError {
    /// Create a new validation error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: None,
            type_name: None,
            reason: None,
        }
    }

    /// Set the path where validation failed
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the record type
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Prefix the path with the name of an enclosing field
    pub fn nested_in(mut self, field: &str) -> Self {
        self.path = Some(match self.path.take() {
            Some(path) => format!("{}/{}", field, path),
            None => field.to_string(),
        });
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref type_name) = self.type_name {
            write!(f, " (in {})", type_name)?;
        }

        if let Some(ref path) = self.path {
            write!(f, " at {}", path)?;
        }

        if let Some(ref reason) = self.reason {
            write!(f, ": {}", reason)?;
        }

        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Failure to turn a placeholder reference into a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionError {
    /// Identifier that was looked up
    pub reference: String,
    /// Expected record type
    pub target_type: Option<String>,
    /// Why the lookup failed
    pub reason: Option<String>,
}

impl ResolutionError {
    /// Create a new resolution error for an identifier
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            target_type: None,
            reason: None,
        }
    }

    /// Set the expected record type
    pub fn with_target_type(mut self, target_type: impl Into<String>) -> Self {
        self.target_type = Some(target_type.into());
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot resolve '{}'", self.reference)?;

        if let Some(ref target) = self.target_type {
            write!(f, " to {}", target)?;
        }

        if let Some(ref reason) = self.reason {
            write!(f, ": {}", reason)?;
        }

        Ok(())
    }
}

impl std::error::Error for ResolutionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("required attribute 'typeName' is missing")
            .with_type_name("DeleteType")
            .with_path("typeName")
            .nested_in("Transaction");

        let msg = format!("{}", err);
        assert!(msg.contains("typeName' is missing"));
        assert!(msg.contains("(in DeleteType)"));
        assert!(msg.contains("at Transaction/typeName"));
    }

    #[test]
    fn test_resolution_error_display() {
        let err = ResolutionError::new("q1")
            .with_target_type("QueryExpression")
            .with_reason("no such id");

        assert_eq!(
            err.to_string(),
            "cannot resolve 'q1' to QueryExpression: no such id"
        );
    }

    #[test]
    fn test_error_conversion() {
        let val_err = ValidationError::new("test");
        let err: Error = val_err.into();
        assert!(matches!(err, Error::Validation(_)));

        let res_err = ResolutionError::new("x");
        let err: Error = res_err.into();
        assert!(matches!(err, Error::Resolution(_)));
    }

    #[test]
    fn test_index_error_display() {
        assert_eq!(
            Error::index(4, 2).to_string(),
            "index 4 out of range for length 2"
        );
    }
}
