//! Canvas Gallery API library.
//!
//! The server binary and the CLI both build on this crate; the test suites
//! drive it through [`routes::app`] with an in-memory store.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
