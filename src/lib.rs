//! A minimal ledger of hash-linked blocks, admitted by proof of work and
//! authorized by signed transactions.

pub mod blockchain;
pub mod config;

pub use blockchain::{Block, Chain, ChainError, Transaction, Wallet};
pub use config::LedgerConfig;
