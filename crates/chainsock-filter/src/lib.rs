//! chainsock-filter: block poller and filter pipeline.
//!
//! A [`Poller`] watches the chain head and hands every new height to a
//! [`BlockHandler`]. [`Filter`] is the block handler that fetches the block,
//! its receipts and its transactions, and dispatches:
//!
//! 1. one-shot transaction-hash filters ([`ReceiptHandler`])
//! 2. event filters, decoded through the contract ABI ([`EventHandler`])
//! 3. address filters on sender or recipient ([`TransactionHandler`])

pub mod error;
pub mod filter;
pub mod handler;
pub mod poller;
pub mod predicate;
pub mod source;

pub use error::FilterError;
pub use filter::Filter;
pub use handler::{
    handler_fn, BlockHandler, EventHandler, FnHandler, ReceiptHandler, TransactionHandler,
};
pub use poller::{Poller, PollerConfig};
pub use predicate::{BlockPredicate, CompareOp, EventFilter, FieldPredicate};
pub use source::{BlockSource, RpcSource};
