//! Error types for rollcall.
//!
//! This module defines all error types used throughout the rollcall crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::photo::DeviceError;

/// The main error type for rollcall operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Capture Errors ===
    /// The camera could not be opened or read.
    #[error("camera unavailable: {0}")]
    Device(#[from] DeviceError),

    /// The requested operation does not apply to the widget's current state.
    #[error("invalid capture state: {0}")]
    InvalidState(String),

    /// The camera stream has not produced a frame yet.
    #[error("camera has not produced a frame")]
    NoFrame,

    // === Image Errors ===
    /// Encoding or decoding a raster image failed.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// The selected content is not a recognized image format.
    #[error("unsupported image: {reason}")]
    UnsupportedImage {
        /// Why the content was rejected.
        reason: String,
    },

    /// A stored image string is not a valid base64 data URI.
    #[error("invalid data URI: {reason}")]
    InvalidDataUri {
        /// Why the URI could not be parsed.
        reason: String,
    },

    // === Record Errors ===
    /// A member record failed validation.
    #[error("invalid {field}: {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// No member exists with the given ID.
    #[error("member {id} not found")]
    NotFound {
        /// The ID that was looked up.
        id: i64,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rollcall operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Create a validation error for the named field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create an unsupported image error.
    #[must_use]
    pub fn unsupported_image(reason: impl Into<String>) -> Self {
        Self::UnsupportedImage {
            reason: reason.into(),
        }
    }

    /// Create an invalid data URI error.
    #[must_use]
    pub fn invalid_data_uri(reason: impl Into<String>) -> Self {
        Self::InvalidDataUri {
            reason: reason.into(),
        }
    }

    /// Check if this error means the camera could not be used.
    #[must_use]
    pub fn is_device_unavailable(&self) -> bool {
        matches!(self, Self::Device(_))
    }

    /// Check if this error is a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::NotFound { id: 7 };
        assert_eq!(err.to_string(), "member 7 not found");

        let err = Error::internal("test error");
        assert_eq!(err.to_string(), "internal error: test error");
    }

    #[test]
    fn test_error_is_not_found() {
        assert!(Error::NotFound { id: 1 }.is_not_found());
        assert!(!Error::internal("test").is_not_found());
    }

    #[test]
    fn test_error_is_device_unavailable() {
        let err: Error = DeviceError::PermissionDenied.into();
        assert!(err.is_device_unavailable());
        assert!(!Error::NoFrame.is_device_unavailable());
    }

    #[test]
    fn test_device_error_display() {
        let err: Error = DeviceError::NotFound.into();
        let msg = err.to_string();
        assert!(msg.contains("camera unavailable"));
        assert!(msg.contains("no camera"));
    }

    #[test]
    fn test_validation_error_display() {
        let err = Error::validation("name", "is required");
        assert_eq!(err.to_string(), "invalid name: is required");
    }

    #[test]
    fn test_invalid_state_error() {
        let err = Error::invalid_state("camera is not live");
        assert!(err.to_string().contains("camera is not live"));
    }

    #[test]
    fn test_unsupported_image_error() {
        let err = Error::unsupported_image("not an image");
        assert!(err.to_string().contains("not an image"));
    }

    #[test]
    fn test_invalid_data_uri_error() {
        let err = Error::invalid_data_uri("missing prefix");
        assert!(err.to_string().contains("missing prefix"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_database_migration_error_display() {
        let err = Error::DatabaseMigration {
            message: "version mismatch".to_string(),
        };
        assert!(err.to_string().contains("version mismatch"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "invalid stroke width".to_string(),
        };
        assert!(err.to_string().contains("invalid stroke width"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
