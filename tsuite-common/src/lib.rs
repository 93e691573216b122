pub mod types;
pub mod error;
pub mod config;

pub use types::*;
pub use error::{Result, TsuiteError};
pub use config::{DashboardConfig, DataConfig, DisplayConfig, ServerConfig};
