//! Warning entity - Append-only moderation warnings.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Warning database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "warnings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub warn_id: i64,
    /// Guild the warning was issued in
    pub guild_id: i64,
    /// Warned member
    pub user_id: i64,
    /// Moderator who issued it
    pub moderator_id: i64,
    /// Free-text reason
    pub reason: String,
    /// When it was issued
    pub timestamp: DateTimeUtc,
}

/// Warnings have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
