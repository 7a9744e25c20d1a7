//! Discord command implementations organized by category.

#![allow(clippy::too_long_first_doc_paragraph)]

/// Server configuration commands: aliases, log channels, broadcast, sync
pub mod admin;

/// Credit balance, daily reward and transfers
pub mod economy;

/// Chat games
pub mod games;

/// General utility commands
pub mod general;

/// Moderation commands
pub mod moderation;

/// Ticket setup and panel
pub mod tickets;

// Export commands
pub use admin::*;
pub use economy::*;
pub use games::*;
pub use general::*;
pub use moderation::*;
pub use tickets::*;
