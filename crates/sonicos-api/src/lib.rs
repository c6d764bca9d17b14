//! SonicOS REST API client.
//!
//! Provides typed resource requests and an asynchronous client for the
//! SonicOS management API (`https://{host}:{port}/api/sonicos/`).
//!
//! ```no_run
//! use sonicos_api::{SonicOsClient, Verb};
//! use sonicos_core::config::ConnectionConfig;
//! use sonicos_core::types::AddressObjectType;
//!
//! # async fn run() -> sonicos_api::Result<()> {
//! let config = ConnectionConfig::new("192.168.168.168", 443, "admin", "password")?;
//! let client = SonicOsClient::new(config)?;
//! let session = client.session();
//!
//! session.login().await?;
//! let objects = session
//!     .address_objects(AddressObjectType::Ipv4, Verb::Get, None, Vec::new())
//!     .await?;
//! println!("{}", objects.into_value());
//! session.logout().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

mod auth;
pub mod client;
pub mod models;
pub mod resource;

pub use client::{Session, SonicOsClient, SonicOsClientBuilder};
pub use models::{
    ApiResponse, LoginOutcome, RestartRequest, RestartSchedule, StatusEnvelope, VersionInfo,
};
pub use resource::{Payload, ResourceKind, ResourceRequest, Selector};
pub use sonicos_core::types::Verb;

/// Convenient result alias that reuses the shared SonicOS error type.
pub type Result<T> = sonicos_core::Result<T>;
