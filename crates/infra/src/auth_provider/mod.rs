//! Authentication provider boundary.
//!
//! The provider owns credentials and the current session. It reports session
//! changes through a `watch` channel: the value is the signed-in user, or
//! `None` when signed out. The value present at subscription time is the
//! session restored at startup.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryAuthProvider;
pub use r#trait::{AuthProvider, AuthProviderError, AuthUser};
