use async_trait::async_trait;
use ethers::providers::Middleware;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionRequest, TxHash,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::errors::{BridgeError, Result};

/// Signs and submits calls on whichever chain the wallet is pointed at.
#[async_trait]
pub trait ChainSigner: Send + Sync {
    /// Account that signs submitted transactions.
    async fn address(&self) -> Result<Address>;

    /// Read-only `eth_call` against `to`.
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes>;

    /// Signs and broadcasts a transaction, returning its hash once accepted.
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;
}

/// [`ChainSigner`] over any `ethers` middleware stack, typically a
/// `SignerMiddleware<Provider<Http>, LocalWallet>`.
#[derive(Debug)]
pub struct MiddlewareSigner<M> {
    client: Arc<M>,
}

impl<M> MiddlewareSigner<M> {
    pub fn new(client: M) -> Self {
        Self { client: Arc::new(client) }
    }
}

#[async_trait]
impl<M> ChainSigner for MiddlewareSigner<M>
where
    M: Middleware + 'static,
{
    async fn address(&self) -> Result<Address> {
        self.client
            .default_sender()
            .ok_or_else(|| BridgeError::Provider("Signer has no default account".to_string()))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        self.client
            .call(&tx, None)
            .await
            .map_err(|e| BridgeError::Blockchain(format!("eth_call to {:?} failed: {}", to, e)))
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(|e| BridgeError::Blockchain(format!("Failed to send transaction: {}", e)))?;
        let tx_hash = pending.tx_hash();
        debug!(tx_hash = ?tx_hash, "Transaction accepted by node");
        Ok(tx_hash)
    }
}
