use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use entity_api::error::Error as EntityApiError;

pub type Result<T> = core::result::Result<T, Error>;

/// Reasons a subscribe request is turned away before streaming starts.
#[derive(Debug)]
pub enum Error {
    /// The request path did not carry a complete identity.
    InvalidIdentity(String),
    /// The credential store answered, and the identity is unknown.
    UnknownIdentity(String),
    /// The credential store could not answer.
    CredentialCheck(EntityApiError),
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::CredentialCheck(e) => Some(e),
            _ => None,
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        match self {
            Error::InvalidIdentity(reason) => write!(fmt, "invalid subscribe request: {reason}"),
            Error::UnknownIdentity(user_id) => write!(fmt, "nonexistent user: {user_id}"),
            Error::CredentialCheck(e) => write!(fmt, "credential check failed: {e}"),
        }
    }
}

// Failure responses carry no body.
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::InvalidIdentity(_) | Error::UnknownIdentity(_) => {
                StatusCode::BAD_REQUEST.into_response()
            }
            Error::CredentialCheck(_) => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        }
    }
}

impl From<EntityApiError> for Error {
    fn from(err: EntityApiError) -> Self {
        Self::CredentialCheck(err)
    }
}
