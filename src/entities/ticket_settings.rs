//! Ticket settings entity - Per-guild ticket configuration written by `/ticket setup`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ticket configuration database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ticket_settings")]
pub struct Model {
    /// Guild this configuration belongs to
    #[sea_orm(primary_key, auto_increment = false)]
    pub guild_id: i64,
    /// Category that ticket channels are created under
    pub category_id: i64,
    /// Channel that receives close notices and transcripts
    pub logs_channel_id: Option<i64>,
    /// General staff role
    pub staff_role_id: i64,
    /// Role that handles staff applications
    pub staff_app_role_id: Option<i64>,
    /// Role that handles inquiries
    pub inquiry_role_id: Option<i64>,
    /// Role that handles complaints
    pub complaint_role_id: Option<i64>,
    /// Role that handles verification requests
    pub girl_verif_role_id: Option<i64>,
}

/// Ticket settings have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
