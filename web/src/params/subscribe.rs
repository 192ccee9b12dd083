use crate::error::{Error, Result};
use axum::extract::{rejection::PathRejection, Path};
use sse::Identity;
use std::collections::HashMap;

pub(crate) const TOPIC: &str = "topic";
pub(crate) const USER_ID: &str = "user_id";
pub(crate) const NONCE: &str = "nonce";

pub(crate) type SubscribePath = core::result::Result<Path<HashMap<String, String>>, PathRejection>;

/// Reads all three identity segments; a missing or empty one fails the request.
pub(crate) fn parse_identity(path: SubscribePath) -> Result<Identity> {
    let Path(params) = path.map_err(|e| Error::InvalidIdentity(e.body_text()))?;

    let segment = |name: &str| {
        params
            .get(name)
            .filter(|value| !value.is_empty())
            .cloned()
            .ok_or_else(|| {
                Error::InvalidIdentity(format!(
                    "expected /subscribe/<topic>/<userid>/<nonce>, missing {name}"
                ))
            })
    };

    Ok(Identity::new(segment(TOPIC)?, segment(USER_ID)?, segment(NONCE)?))
}
