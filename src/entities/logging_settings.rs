//! Logging settings entity - Six optional log channels per guild.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Log channel map database model
#[derive(Clone, Debug, PartialEq, Eq, Default, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "logging_settings")]
pub struct Model {
    /// Guild id
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    /// Message deletes and edits
    pub msg_log_id: Option<i64>,
    /// Member role changes
    pub role_log_id: Option<i64>,
    /// Server-level changes (name, roles, members, invites)
    pub server_log_id: Option<i64>,
    /// Channel create/delete/update
    pub room_log_id: Option<i64>,
    /// Voice activity
    pub voice_log_id: Option<i64>,
    /// Moderator actions
    pub mod_log_id: Option<i64>,
}

/// Logging settings have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
