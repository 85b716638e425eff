//! Session authentication for the vCenter REST API.
//!
//! This module provides:
//! - `Credentials`: the username/password pair used to open sessions
//! - `validate_session` / `create_session`: the two calls against `/api/session`
//! - `AuthInterceptor`: attaches a live session token to every outgoing request
//!
//! Tokens live in memory only, for as long as the client handle does.

pub mod credentials;
pub mod interceptor;
pub mod session;

pub use credentials::Credentials;
pub use interceptor::{AuthInterceptor, SessionState};
pub use session::{create_session, validate_session, SessionInfo, VMWARE_SESSION_ID};
