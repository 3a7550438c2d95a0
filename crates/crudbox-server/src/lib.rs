// Library exports for the binary and integration tests

pub mod admin_api;
pub mod analysis;
pub mod app;
pub mod config;
pub mod locks;
pub mod manager;
pub mod matcher;
pub mod metrics;
pub mod model;
pub mod openapi;
pub mod reconcile;
pub mod serving;
pub mod store;

pub use app::App;
pub use config::Config;
