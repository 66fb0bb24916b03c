//! Authentication module for managing user sessions.
//!
//! This module provides:
//! - `Session`: the access/refresh token pair plus the signed-in user
//! - `SessionStore`: durable persistence of the session (file or in-memory)
//! - `AuthManager`: the login/logout lifecycle that owns every session write
//!
//! Sessions are persisted to disk so a restart keeps the user signed in.

pub mod claims;
pub mod error;
pub mod identity;
pub mod manager;
pub mod session;

pub use error::{AuthError, StoreError};
pub use identity::TokenPair;
pub use manager::AuthManager;
pub use session::{FileSessionStore, MemorySessionStore, Session, SessionStore, User};
