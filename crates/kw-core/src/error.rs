use thiserror::Error;

use crate::status::Status;

/// Fallback message when the store has no description for a status.
pub const UNHANDLED_ERROR_MESSAGE: &str = "Unhandled Error";

/// Errors surfaced by every keychain operation, whatever the calling style.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeychainError {
    /// The secret could not be encoded as UTF-8 bytes. The store was not touched.
    #[error("String to data conversion error")]
    Encoding,

    /// The stored bytes could not be decoded back to a UTF-8 string.
    #[error("Data to string conversion error")]
    Decoding,

    /// No entry exists for the key (only under `MissingEntryPolicy::Error`).
    #[error("Data is not exists")]
    NotFound,

    /// Any other non-success status reported by the platform store.
    #[error("Unknown Error, {message} ({status})")]
    Store { status: Status, message: String },

    /// The background unit of work was lost before it delivered a result.
    #[error("keychain operation was dropped before completing: {0}")]
    Dispatch(String),
}

impl KeychainError {
    /// Builds a [`KeychainError::Store`], resolving the message with the
    /// generic fallback when the platform has none.
    pub fn store(status: Status, message: Option<String>) -> Self {
        Self::Store {
            status,
            message: message.unwrap_or_else(|| UNHANDLED_ERROR_MESSAGE.to_string()),
        }
    }

    /// Platform status carried by this error, if any.
    pub fn status(&self) -> Option<Status> {
        match self {
            Self::Store { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type KeychainResult<T> = Result<T, KeychainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_falls_back_to_unhandled_message() {
        let err = KeychainError::store(Status::IO, None);
        match &err {
            KeychainError::Store { message, .. } => assert_eq!(message, UNHANDLED_ERROR_MESSAGE),
            other => panic!("expected Store, got: {:?}", other),
        }
        assert_eq!(err.status(), Some(Status::IO));
    }

    #[test]
    fn store_error_display_includes_code() {
        let err = KeychainError::store(Status::AUTH_FAILED, Some("bad pass".into()));
        let text = err.to_string();
        assert!(text.contains("bad pass"));
        assert!(text.contains("-25293"));
    }
}
