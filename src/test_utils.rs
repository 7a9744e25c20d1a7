//! Shared test utilities.
//!
//! Every test gets its own in-memory `SQLite` database with all tables created, plus a few
//! seed helpers for the rows most tests need.

use crate::{
    core::{economy, tickets},
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Creates an account holding `credits`.
pub async fn create_funded_account(
    db: &DatabaseConnection,
    user_id: u64,
    credits: i64,
) -> Result<entities::user::Model> {
    economy::get_or_create_account(db, user_id).await?;
    economy::credit(db, user_id, credits).await
}

/// Ticket setup with every optional role configured.
///
/// Ids are derived from `guild_id` so that two guilds seeded in the same database don't share
/// roles: category `+1`, logs `+2`, staff `+10`, application `+11`, inquiry `+12`,
/// complaint `+13`, verification `+14`.
#[must_use]
pub const fn full_ticket_setup(guild_id: u64) -> tickets::TicketSetup {
    tickets::TicketSetup {
        guild_id,
        category_id: guild_id + 1,
        logs_channel_id: Some(guild_id + 2),
        staff_role_id: guild_id + 10,
        staff_app_role_id: Some(guild_id + 11),
        inquiry_role_id: Some(guild_id + 12),
        complaint_role_id: Some(guild_id + 13),
        girl_verif_role_id: Some(guild_id + 14),
    }
}

/// Stores [`full_ticket_setup`] for `guild_id`.
pub async fn setup_with_tickets(
    guild_id: u64,
) -> Result<(DatabaseConnection, entities::ticket_settings::Model)> {
    let db = setup_test_db().await?;
    let settings = tickets::save_settings(&db, full_ticket_setup(guild_id)).await?;
    Ok((db, settings))
}
