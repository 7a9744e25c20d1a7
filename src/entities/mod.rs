//! Entity module - Contains all SeaORM entity definitions for the database.
//! Each table is decoded into a typed `Model` once at the storage boundary.

pub mod command_alias;
pub mod guild_settings;
pub mod logging_settings;
pub mod ticket_settings;
pub mod user;
pub mod warning;

// Re-export specific types to avoid conflicts
pub use command_alias::{
    Column as CommandAliasColumn, Entity as CommandAlias, Model as CommandAliasModel,
};
pub use guild_settings::{
    Column as GuildSettingsColumn, Entity as GuildSettings, Model as GuildSettingsModel,
};
pub use logging_settings::{
    Column as LoggingSettingsColumn, Entity as LoggingSettings, Model as LoggingSettingsModel,
};
pub use ticket_settings::{
    Column as TicketSettingsColumn, Entity as TicketSettings, Model as TicketSettingsModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
pub use warning::{Column as WarningColumn, Entity as Warning, Model as WarningModel};
