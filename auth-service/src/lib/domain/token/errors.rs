use auth::CodecError;
use auth::TokenPurpose;
use thiserror::Error;

/// Error for token lifecycle operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("Token is malformed: {0}")]
    Malformed(String),

    #[error("Token signature is invalid")]
    BadSignature,

    #[error("Token has expired")]
    Expired,

    #[error("Token is not recognized")]
    NotRecognized,

    #[error("Token purpose mismatch: expected {expected}, got {actual}")]
    WrongPurpose {
        expected: TokenPurpose,
        actual: TokenPurpose,
    },

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Token ledger error: {0}")]
    Ledger(String),
}

impl From<CodecError> for TokenError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::EncodingFailed(msg) => TokenError::Encoding(msg),
            CodecError::Malformed(msg) => TokenError::Malformed(msg),
            CodecError::BadSignature => TokenError::BadSignature,
            CodecError::Expired => TokenError::Expired,
        }
    }
}

/// Error raised by a cache backend.
///
/// Never escapes [`TokenCache`](super::cache::TokenCache).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache backend unavailable: {0}")]
    Unavailable(String),

    #[error("Cache entry serialization failed: {0}")]
    Serialization(String),
}
