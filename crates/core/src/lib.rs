//! Canvas Gallery Core - Shared types library.
//!
//! This crate provides common types used across all Canvas Gallery components:
//! - `storefront` - JSON API for customers and gallery admins
//! - `cli` - Command-line tools for migrations, seeding and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules - no I/O, no database
//! access, no HTTP clients. Order status transitions, money arithmetic and
//! order number formatting live here so every component agrees on them.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, statuses
//!   and order numbers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
