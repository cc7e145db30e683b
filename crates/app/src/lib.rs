//! Composition root: configuration and wiring of the mall directory.

pub mod app;
pub mod config;

pub use app::{InMemoryDirectory, MallDirectory, build_in_memory};
pub use config::{AppConfig, ConfigError};
