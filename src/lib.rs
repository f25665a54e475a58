//! Async client for a token-issuing identity service.
//!
//! Wraps the service's signup/login/password endpoints and keeps the
//! cached session token fresh in the background: the token's claims are
//! decoded locally and a single timer refreshes the session at the
//! midpoint of its validity window.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use authn_client::{AuthnClient, ClientConfig, Credentials, MemorySessionStore};
//!
//! # async fn example() -> authn_client::Result<()> {
//! let config = ClientConfig::new("https://auth.example.com");
//! let client = AuthnClient::new(config, Arc::new(MemorySessionStore::new()))?;
//! client
//!     .login(&Credentials {
//!         email: "me@example.com".to_string(),
//!         password: "hunter2".to_string(),
//!     })
//!     .await?;
//! assert!(client.session().await.is_some());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod store;
pub mod token;
pub mod transport;
pub mod types;

pub use client::AuthnClient;
pub use config::ClientConfig;
pub use error::{AuthError, FieldError, Result};
pub use manager::SessionManager;
pub use store::{FileSessionStore, MemorySessionStore, SessionStore};
pub use token::Token;
pub use transport::{HttpTransport, Transport};
pub use types::{Credentials, PasswordScore, SignupForm};
