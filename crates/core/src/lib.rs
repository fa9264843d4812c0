//! StepUp Core - Shared domain types.
//!
//! This crate provides the types shared by every StepUp component:
//! - `api` - The HTTP backend (catalog, cart, checkout, payments)
//! - `cli` - Command-line tools for migrations, seeding and admin accounts
//!
//! # Architecture
//!
//! The core crate contains only types and their rules - no I/O, no database
//! access, no HTTP. Status lifecycles live here so that every caller enforces
//! the same transition table.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, money, roles and status state machines

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
