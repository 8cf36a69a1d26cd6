// src/lib.rs
//! Bridge wallet between Ethereum mainnet and the MVM settlement chain.
//!
//! [`service::BridgeService`] is the entry point; it owns the ledger store,
//! fee quote cache and transaction builder.

pub mod api;
pub mod blockchain;
pub mod cli;
pub mod core;
pub mod service;
pub mod store;
pub mod tools;
pub mod utils;

pub use crate::core::errors::{BridgeError, Result};
