//! SeaORM Entity for the users table.
//! Only the columns needed to verify a subscriber's credentials are mapped.

use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    pub id: Id,

    /// Public user identifier, used as the routing key for broadcasts
    pub uuid: String,

    /// Per-login token a subscriber presents as its nonce
    #[serde(skip_serializing)]
    pub sse_token: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
