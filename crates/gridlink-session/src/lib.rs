//! Session management for Gridlink.
//!
//! This crate handles the lifecycle of the player's identity:
//!
//! 1. **Authentication**: trading a device id for tokens ([`AuthApi`] trait)
//! 2. **Persistence**: keeping tokens between runs ([`CredentialStore`])
//! 3. **Restore and refresh**: resuming and extending sessions
//!    ([`SessionManager`])
//!
//! # How it fits in the stack
//!
//! ```text
//! Client Layer (above)  ← calls ensure_valid() before every backend operation
//!     ↕
//! Session Layer (this crate)  ← owns the current identity and its tokens
//!     ↕
//! Protocol Layer (below)  ← provides the AuthResponse wire type
//! ```

mod auth;
mod credentials;
mod error;
mod manager;
mod session;

pub use auth::AuthApi;
pub use credentials::{
    ACCESS_TOKEN_KEY, CredentialStore, Credentials, FileCredentialStore, MemoryCredentialStore,
    REFRESH_TOKEN_KEY,
};
pub use error::SessionError;
pub use manager::SessionManager;
pub use session::{SESSION_EXPIRY_HORIZON, Session};
