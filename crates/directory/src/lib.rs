//! `malldir-directory`: CRUD services for the mall directory.
//!
//! Shops, offers, categories and floors share one generic service: every
//! operation wraps exactly one store call and records exactly one audit entry
//! describing its outcome before returning.

pub mod category;
pub mod error;
pub mod filter;
pub mod floor;
pub mod offer;
pub mod service;
pub mod shop;

pub use category::{Category, CategoryPatch};
pub use error::ServiceError;
pub use filter::{ListFilter, OfferFilter, ShopFilter};
pub use floor::{Floor, FloorPatch};
pub use offer::{Offer, OfferPatch};
pub use service::EntityService;
pub use shop::{Shop, ShopPatch};

pub type ShopService<S> = EntityService<Shop, S>;
pub type OfferService<S> = EntityService<Offer, S>;
pub type CategoryService<S> = EntityService<Category, S>;
pub type FloorService<S> = EntityService<Floor, S>;
