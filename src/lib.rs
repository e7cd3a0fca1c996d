//! # Admitpath Backend
//!
//! Authentication and session backend for the Admitpath admissions platform.
//! Students, parents, consultants, and administrators share one account
//! store; consultants additionally pass through an administrator approval
//! workflow before they can log in.
//!
//! Sessions are stateless JWT pairs: a short-lived access token for API
//! calls and a longer-lived refresh token that is rotated on every use, with
//! exactly one live refresh token per account.

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod errors;
pub mod observability;
pub mod storage;

pub use config::Config;
pub use errors::{Error, Result};

/// Application name used in logs.
pub const APP_NAME: &str = "admitpath";

/// Application version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
