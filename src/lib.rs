//! `thex-bot` - A Discord community bot
//!
//! Moderation, a credit economy, a ticket desk with claim and transcript handling, audit-log
//! backed activity logging, guild command aliases and a handful of chat games. Core logic lives
//! in [`core`] and never touches Discord types; [`bot`] adapts it to poise commands and gateway
//! events.

#![deny(
    unsafe_code,
    unused_must_use,
    unreachable_patterns,
    rustdoc::broken_intra_doc_links,
    rustdoc::private_intra_doc_links,
)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,

    // Panics and leftovers have no place in event handlers that must keep the gateway alive
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented,

    // Snowflakes are copied around constantly; keep ownership honest
    clippy::clone_on_ref_ptr,
    clippy::needless_pass_by_value,
    clippy::large_types_passed_by_value,

    clippy::too_many_lines,
    clippy::semicolon_if_nothing_returned,
    clippy::redundant_closure_for_method_calls,
    clippy::wildcard_imports,
    clippy::enum_glob_use,

    future_incompatible,
    rust_2018_idioms,
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
)]

// `missing_docs` stays a warning: `#[poise::command]` expands to undocumented items.

/// Discord bot interface - commands, event handlers and shared bot state
pub mod bot;
/// Environment settings, the optional tunables file and database setup
pub mod config;
/// Core business logic - framework-agnostic economy, tickets, logging and games
pub mod core;
/// `SeaORM` entity definitions, one per table
pub mod entities;
/// Unified error types and result handling
pub mod errors;

#[cfg(test)]
pub mod test_utils;
