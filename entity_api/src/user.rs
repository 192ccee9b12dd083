use super::error::Error;
use async_trait::async_trait;
use entity::users::{Column, Entity};
use log::*;
use sea_orm::{entity::prelude::*, ConnectionTrait, DatabaseConnection};
use std::sync::Arc;

/// Looks up whether a subscriber's claimed credentials are known.
///
/// A clean `Ok(false)` means the pair is unknown; `Err` means the store itself
/// could not answer.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn exists(&self, user_id: &str, nonce: &str) -> Result<bool, Error>;
}

/// Returns true when a user with this public id holds this SSE token.
pub async fn exists_with_sse_token(
    db: &impl ConnectionTrait,
    user_id: &str,
    sse_token: &str,
) -> Result<bool, Error> {
    let user = Entity::find()
        .filter(Column::Uuid.eq(user_id))
        .filter(Column::SseToken.eq(sse_token))
        .one(db)
        .await?;

    Ok(user.is_some())
}

/// Postgres-backed credential store.
#[derive(Clone)]
pub struct Backend {
    db: Arc<DatabaseConnection>,
}

impl Backend {
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self { db: Arc::clone(db) }
    }
}

#[async_trait]
impl CredentialStore for Backend {
    async fn exists(&self, user_id: &str, nonce: &str) -> Result<bool, Error> {
        debug!("Checking SSE credentials for user {user_id}");
        exists_with_sse_token(self.db.as_ref(), user_id, nonce).await
    }
}
