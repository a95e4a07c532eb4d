//! Tiercache - a two-tier cache with predictive warmup
//!
//! A bounded in-process tier sits in front of a shared remote store. Remote
//! failures degrade to local-only behaviour instead of surfacing to callers.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod tasks;

pub use api::AppState;
pub use cache::TieredCache;
pub use config::Config;
pub use tasks::spawn_maintenance;
