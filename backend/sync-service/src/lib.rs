pub mod backend;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateways;
pub mod logging;
pub mod seed;
pub mod services;
pub mod state;
pub mod workers;

pub use error::{SyncError, SyncResult};
