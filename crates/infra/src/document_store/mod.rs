//! Collection-based document store boundary.
//!
//! The directory treats the remote document database as an opaque key/value
//! API: per-collection documents addressed by store-assigned ids, equality
//! queries with an optional ordering, and merge-style partial updates.

pub mod in_memory;
pub mod query;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use query::{Direction, FieldFilter, OrderBy, Query};
pub use r#trait::{Document, DocumentStore, DocumentWrite, Fields, StoreError};
