//! Bridge service: the context object wiring configuration, API client,
//! wallet provider, ledger, fee quotes and the transaction builder.

pub mod bridge;

pub use bridge::BridgeService;
