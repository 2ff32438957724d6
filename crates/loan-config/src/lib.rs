//! loan-config
//!
//! Ledger preferences and where the data lives on disk.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{Config, OverpaymentPolicy};
