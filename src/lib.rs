//! QualityGuard command-line client.
//!
//! The binary lives in main.rs; the modules are exposed here so integration
//! tests can drive the API client and the importers directly.

pub mod api;
pub mod assertions;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod transfer;
