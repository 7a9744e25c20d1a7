//! Discord event and interaction handlers
//!
//! Everything that is not a command invocation: gateway events, persistent ticket controls,
//! alias rewriting, activity logs, welcome messages and slash-command autocomplete.

/// Activity-log listeners and the audit-trail reader
pub mod activity_log;
/// Alias rewriting and dispatch
pub mod alias;
/// Autocomplete for the alias commands
pub mod autocomplete;
/// Gateway event dispatch
pub mod events;
/// Ticket panel and ticket control handlers
pub mod interactions;
/// Welcome messages
pub mod welcome;
