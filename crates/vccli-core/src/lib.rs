//! vccli-core - session-authenticated HTTP client for the vCenter REST API.
//!
//! Callers send ordinary requests through a [`ClientHandle`]; every request
//! first passes the [`AuthInterceptor`](auth::AuthInterceptor), which checks
//! the held session token against `/api/session`, opens a new session with
//! basic credentials when the API no longer recognizes it, and attaches the
//! token under the `vmware-api-session-id` header.
//!
//! ```rust,no_run
//! use vccli_core::ClientHandle;
//!
//! # async fn example() -> vccli_core::Result<()> {
//! let client = ClientHandle::new("https://vcenter.example", "administrator@vsphere.local", "secret")?;
//! let vms: serde_json::Value = client.get_json("/api/vcenter/vm").await?;
//! println!("{vms}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod config;
pub mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{Credentials, SessionInfo};
pub use client::{ClientHandle, Transport};
pub use config::ClientConfig;
pub use error::{Error, Result};
