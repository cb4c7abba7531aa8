//! Error Handling Module
//!
//! Defines custom error types for the domainpair library.
//! Uses thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for domainpair operations
#[derive(Error, Debug)]
pub enum DomainPairError {
    /// The dataset root contains no class subdirectories
    #[error("Dataset root '{0}' has no class subdirectories")]
    DirectoryStructure(PathBuf),

    /// A class has zero samples when balanced sampling was requested
    #[error("Class '{0}' has no samples to balance")]
    EmptyClass(String),

    /// Source and target domains expose different class-name sets
    #[error("Source and target classes differ: {source_classes:?} vs {target_classes:?}")]
    ClassMismatch {
        source_classes: Vec<String>,
        target_classes: Vec<String>,
    },

    /// Error decoding an image file
    #[error("Failed to decode image at '{0}': {1}")]
    ImageDecode(PathBuf, String),

    /// Error with dataset operations
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Convenience Result type for domainpair operations
pub type Result<T> = std::result::Result<T, DomainPairError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainPairError::Dataset("test error".to_string());
        assert_eq!(format!("{}", err), "Dataset error: test error");
    }

    #[test]
    fn test_image_decode_error() {
        let path = PathBuf::from("/path/to/image.jpg");
        let err = DomainPairError::ImageDecode(path, "bad header".to_string());
        assert!(format!("{}", err).contains("image.jpg"));
    }

    #[test]
    fn test_class_mismatch_error() {
        let err = DomainPairError::ClassMismatch {
            source_classes: vec!["cat".into(), "dog".into()],
            target_classes: vec!["cat".into()],
        };
        assert!(format!("{}", err).contains("dog"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: DomainPairError = io.into();
        assert!(matches!(err, DomainPairError::Io(_)));
    }
}
