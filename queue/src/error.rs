//! Error types for the queue transport.
use std::error::Error as StdError;
use std::fmt;

#[derive(Debug)]
pub struct Error {
    pub source: Option<lapin::Error>,
    pub error_kind: TransportErrorKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransportErrorKind {
    /// Could not reach the broker or open a channel on it.
    Connection,
    /// The broker rejected a queue declaration or QoS change.
    Setup,
    /// Reading from an established consumer failed.
    Receive,
    /// A delivery was requested before consuming started.
    NotConsuming,
}

impl Error {
    pub fn new(error_kind: TransportErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub(crate) fn with_source(error_kind: TransportErrorKind) -> impl FnOnce(lapin::Error) -> Self {
        move |source| Self {
            source: Some(source),
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "Queue Transport Error: {:?}: {source}", self.error_kind),
            None => write!(f, "Queue Transport Error: {:?}", self.error_kind),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn StdError + 'static))
    }
}
