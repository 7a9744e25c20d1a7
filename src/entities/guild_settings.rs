//! Guild settings entity - Leveling channel and the per-guild ticket counter.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Guild settings database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "guild_settings")]
pub struct Model {
    /// Guild id
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    /// Channel for level-up announcements
    pub leveling_channel_id: Option<i64>,
    /// Last ticket sequence number handed out
    pub ticket_counter: i64,
}

/// Guild settings have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
