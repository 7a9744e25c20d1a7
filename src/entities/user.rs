//! User entity - One economy account per Discord user.
//!
//! Accounts are created lazily the first time a user touches the economy. The leveling
//! columns are kept alongside the ledger so both share one row per user.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Economy account database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Discord user id
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i64,
    /// Credit balance
    pub credits: i64,
    /// Accumulated experience points
    pub xp: i64,
    /// Current level
    pub level: i64,
    /// When the daily reward was last claimed
    pub last_daily: Option<DateTimeUtc>,
    /// Reputation points
    pub rep: i64,
}

/// Users have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
