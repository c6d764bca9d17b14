//! # sonicos-core
//!
//! Core types and utilities for working with the SonicOS management REST API.
//!
//! This crate provides the error taxonomy, connection configuration, typed
//! path segments and the HTTP transport seam shared by SonicOS clients.
//!
//! ## Modules
//!
//! - [`error`] - Error types and conversions
//! - [`types`] - Wire-level enums (IP versions, verbs, firmware generations, ...)
//! - [`config`] - Connection configuration and credentials
//! - [`client`] - HTTP client configuration and the [`client::Transport`] trait

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
