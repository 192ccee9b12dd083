//! Error types for message dispatch.
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<serde_json::Error>,
    pub error_kind: DispatchErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum DispatchErrorKind {
    /// Body is not a JSON object carrying a `type` string.
    Malformed,
    /// `type` was missing or empty.
    MissingType,
    /// No handler registered for this `type`.
    UnknownType(String),
}

impl Error {
    pub(crate) fn malformed(source: serde_json::Error) -> Self {
        Self {
            source: Some(source),
            error_kind: DispatchErrorKind::Malformed,
        }
    }

    pub(crate) fn kind(error_kind: DispatchErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.error_kind, &self.source) {
            (DispatchErrorKind::Malformed, Some(source)) => {
                write!(f, "unable to get message type from message: {source}")
            }
            (DispatchErrorKind::Malformed, None) => {
                write!(f, "unable to get message type from message")
            }
            (DispatchErrorKind::MissingType, _) => {
                write!(f, "unable to get message type from message, empty type")
            }
            (DispatchErrorKind::UnknownType(message_type), _) => {
                write!(f, "got message of unknown type: {message_type}")
            }
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}
