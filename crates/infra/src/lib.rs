//! Infrastructure layer: the document store and auth provider boundaries.
//!
//! Both collaborators are external to the directory; this crate defines the
//! traits the rest of the workspace programs against, plus in-memory adapters
//! for tests and local development.

pub mod auth_provider;
pub mod clock;
pub mod document_store;

pub use auth_provider::{AuthProvider, AuthProviderError, AuthUser, InMemoryAuthProvider};
pub use clock::{Clock, ManualClock, SystemClock};
pub use document_store::{
    Direction, Document, DocumentStore, DocumentWrite, FieldFilter, Fields, InMemoryDocumentStore,
    OrderBy, Query, StoreError,
};
