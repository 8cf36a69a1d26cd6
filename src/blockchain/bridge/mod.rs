pub mod classifier;
pub mod extra;
pub mod transaction;

pub use classifier::{classify, AssetShape, TransferDirection};
pub use extra::ExtraEncoder;
pub use transaction::{SwapReceipt, TransactionBuilder, WithdrawReceipt, WithdrawRequest};
