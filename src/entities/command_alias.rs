//! Command alias entity - Guild-scoped alternative names for commands.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Command alias database model, unique per `(guild_id, alias)`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "command_aliases")]
pub struct Model {
    /// Guild the alias is registered in
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    /// Alias text as typed by members
    #[sea_orm(primary_key, auto_increment = false)]
    pub alias: String,
    /// Canonical command name the alias expands to
    pub command_name: String,
}

/// Aliases have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
