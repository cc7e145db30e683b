//! `malldir-core`: domain building blocks shared by every mall-directory crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{CREATED_AT, Entity, EntityKind, Record, UPDATED_AT};
pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, IdentityId};
