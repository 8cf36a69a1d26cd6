pub mod config;
pub mod domain;
pub mod errors;
pub mod validation;

pub use config::BridgeConfig;
pub use domain::{Asset, Network, RegisteredUser};
pub use errors::{BridgeError, Result};
