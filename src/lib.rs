pub mod config;
pub mod engine;
pub mod error;
pub mod ops;
pub mod relations;
pub mod schema;
pub mod store;
pub mod transform;

pub use config::AppConfig;
pub use error::{MaintError, Result};
