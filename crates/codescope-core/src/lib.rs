//! Configuration, secrets and component wiring shared by codescope front ends.

pub mod bootstrap;
pub mod config;
pub mod vault;

pub use bootstrap::AppBuilder;
pub use config::{Config, ProviderKind};
