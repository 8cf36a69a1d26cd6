pub mod cache;
pub mod fees;
pub mod ledger;

pub use cache::{AsyncCell, CachePolicy, KeyedAsyncCache};
pub use fees::{FeeQuoteKey, FeeQuotes};
pub use ledger::{total_value, LedgerStore, PolledContainer, PriceKind, Subscription};
