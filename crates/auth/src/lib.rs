//! `malldir-auth`: who is signed in, and what they may open.
//!
//! The gate follows the auth provider's session notifications, resolves the
//! signed-in identity's role from the `users` collection, and attributes audit
//! entries to that identity. Guard checks are pure; redirecting is left to the
//! page layer.

pub mod authorize;
pub mod error;
pub mod gate;
pub mod principal;
pub mod roles;

pub use authorize::{AccessDenied, require_admin, require_auth};
pub use error::AuthError;
pub use gate::{AUTH_MODULE, AuthGate, AuthState, USERS_COLLECTION};
pub use principal::{Identity, UserProfile};
pub use roles::Role;
