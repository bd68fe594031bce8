//! Common utilities and shared types for mastokey.
//!
//! This crate provides foundational components used across all mastokey crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//!
//! # Example
//!
//! ```no_run
//! use mastokey_common::{AppResult, Config};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     println!("Listening on {}:{}", config.server.host, config.server.port);
//!     Ok(())
//! }
//! ```

#![allow(missing_docs)]

pub mod config;
pub mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
