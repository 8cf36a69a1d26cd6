pub mod bridge;
pub mod contracts;
pub mod network;
pub mod provider;
pub mod reader;
pub mod signer;

pub use network::ensure_network;
pub use provider::{LocalWalletProvider, ProviderRpcError, WalletProvider};
pub use reader::{ChainReader, ChainReaders};
pub use signer::{ChainSigner, MiddlewareSigner};
