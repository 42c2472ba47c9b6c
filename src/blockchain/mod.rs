// Blockchain module
//
// This module contains the core ledger implementation including:
// - Transaction structure
// - Block structure and hashing
// - Proof of work algorithm
// - Chain admission and verification
// - Cryptography utilities and wallets

pub mod block;
pub mod chain;
pub mod crypto;
pub mod pow;
pub mod transaction;
pub mod wallet;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Chain, ChainError};
pub use crypto::{CryptoError, DigitalSignature};
pub use pow::{CancelToken, MiningError, ProofOfWork};
pub use transaction::Transaction;
pub use wallet::Wallet;
