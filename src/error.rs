//! Error types for cipherkit

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for cipherkit
#[derive(Error, Debug)]
pub enum Error {
    /// An operation was attempted on a tool that has no key assigned.
    ///
    /// This is a construction defect in the caller, not an environmental
    /// failure. See [`Error::is_fatal`].
    #[error("Configuration error: {0}")]
    Configuration(String),

    // Provider lookup errors
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid key length: expected {expected}, got {got}")]
    InvalidKeyLength { expected: String, got: usize },

    // Primitive errors
    #[error("Cryptographic failure: {0}")]
    Cryptographic(String),

    #[error("Random source failure: {0}")]
    Random(String),

    // Envelope errors
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Encode error: {0}")]
    Encode(String),

    // Settings errors
    #[error("Configuration file error: {0}")]
    Config(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    /// True for the missing-key precondition violation.
    ///
    /// Every other variant is recoverable and should be handled as
    /// "operation could not be completed".
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }

    /// Short taxonomy name, used as a structured log field
    pub fn category(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::UnsupportedAlgorithm(_) => "unsupported_algorithm",
            Error::InvalidParameters(_) | Error::InvalidKeyLength { .. } => "invalid_parameters",
            Error::Cryptographic(_) | Error::Random(_) => "cryptographic_failure",
            Error::Decode(_) => "decode",
            Error::Encode(_) => "encode",
            Error::Config(_) | Error::InvalidConfig(_) | Error::Io(_) => "settings",
        }
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::Decode(format!("Invalid Base64 input: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_configuration_is_fatal() {
        assert!(Error::Configuration("no key".to_string()).is_fatal());
        assert!(!Error::UnsupportedAlgorithm("DES".to_string()).is_fatal());
        assert!(!Error::Cryptographic("bad padding".to_string()).is_fatal());
        assert!(!Error::Decode("missing iv".to_string()).is_fatal());
    }

    #[test]
    fn test_categories() {
        let err = Error::InvalidKeyLength {
            expected: "16, 24 or 32".to_string(),
            got: 7,
        };
        assert_eq!(err.category(), "invalid_parameters");
        assert_eq!(err.to_string(), "Invalid key length: expected 16, 24 or 32, got 7");
        assert_eq!(Error::Random("os".to_string()).category(), "cryptographic_failure");
        assert_eq!(Error::Encode("json".to_string()).category(), "encode");
        assert_eq!(
            Error::from(std::io::Error::from(std::io::ErrorKind::NotFound)).category(),
            "settings"
        );
    }

    #[test]
    fn test_base64_error_maps_to_decode() {
        use base64::Engine;
        let err: Error = base64::engine::general_purpose::STANDARD
            .decode("not base64!")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Decode(_)));
    }
}
