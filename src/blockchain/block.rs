use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::transaction::Transaction;

/// Upper bound (inclusive) for randomly drawn nonce seeds
pub const MAX_NONCE_SEED: u64 = 999_999_999;

/// Represents a block in the blockchain
///
/// The block hash is never stored; [`Block::hash`] derives it from the
/// other fields on every call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    /// Hash of the previous block, `None` only for the genesis block
    pub previous_hash: Option<String>,

    /// The transaction recorded by this block
    pub transaction: Transaction,

    /// Creation time in Unix milliseconds
    pub timestamp: i64,

    /// Proof of work nonce
    pub nonce: u64,
}

impl Block {
    /// Creates a new block stamped with the current time and a random nonce seed
    ///
    /// The nonce comes from a non-cryptographic generator; it only seeds the
    /// proof of work search.
    pub fn new(previous_hash: Option<String>, transaction: Transaction) -> Self {
        let nonce = rand::thread_rng().gen_range(0..=MAX_NONCE_SEED);
        Block::with_nonce(previous_hash, transaction, nonce)
    }

    /// Creates a new block stamped with the current time and the given nonce
    pub fn with_nonce(previous_hash: Option<String>, transaction: Transaction, nonce: u64) -> Self {
        Block::from_parts(previous_hash, transaction, Utc::now().timestamp_millis(), nonce)
    }

    /// Creates a block from every field, for reproducible hashes
    pub fn from_parts(
        previous_hash: Option<String>,
        transaction: Transaction,
        timestamp: i64,
        nonce: u64,
    ) -> Self {
        Block {
            previous_hash,
            transaction,
            timestamp,
            nonce,
        }
    }

    /// Creates the genesis block (first block in the chain)
    pub fn genesis() -> Self {
        Block::new(None, Transaction::genesis())
    }

    /// Whether this block has no predecessor
    pub fn is_genesis(&self) -> bool {
        self.previous_hash.is_none()
    }

    /// The canonical encoding hashed by [`Block::hash`]
    ///
    /// Field order: `previousHash`, `transaction`, `timestamp`, `nonce`.
    pub fn to_bytes(&self) -> Vec<u8> {
        serde_json::json!({
            "previousHash": self.previous_hash,
            "transaction": self.transaction.canonical_value(),
            "timestamp": self.timestamp,
            "nonce": self.nonce,
        })
        .to_string()
        .into_bytes()
    }

    /// Calculates the hash of the block
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the canonical encoding as a lowercase hexadecimal string
    pub fn hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_bytes());
        hex::encode(hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Block {
        Block::from_parts(
            Some("previous_hash".to_string()),
            Transaction::new(10.0, "sender", "payee"),
            1_700_000_000_000,
            42,
        )
    }

    #[test]
    fn test_new_block() {
        let block = Block::new(Some("previous_hash".to_string()), Transaction::genesis());

        assert_eq!(block.previous_hash.as_deref(), Some("previous_hash"));
        assert!(block.nonce <= MAX_NONCE_SEED);
        assert!(block.timestamp > 0);
        assert!(!block.is_genesis());
    }

    #[test]
    fn test_genesis_block() {
        let block = Block::genesis();

        assert!(block.is_genesis());
        assert_eq!(block.transaction, Transaction::genesis());
    }

    #[test]
    fn test_canonical_encoding() {
        let encoded = String::from_utf8(sample().to_bytes()).unwrap();
        assert_eq!(
            encoded,
            concat!(
                r#"{"previousHash":"previous_hash","#,
                r#""transaction":{"amount":10.0,"sender":"sender","payee":"payee"},"#,
                r#""timestamp":1700000000000,"nonce":42}"#
            )
        );

        let genesis = Block::from_parts(None, Transaction::genesis(), 1, 2);
        let encoded = String::from_utf8(genesis.to_bytes()).unwrap();
        assert!(encoded.starts_with(r#"{"previousHash":null,"#));
    }

    #[test]
    fn test_hash_is_deterministic() {
        let block = sample();
        let hash = block.hash();

        assert_eq!(hash.len(), 64); // SHA-256 hash is 64 characters in hex
        assert!(hash.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
        assert_eq!(hash, block.hash());
        assert_eq!(hash, sample().hash());
    }

    #[test]
    fn test_hash_tracks_every_field() {
        let original = sample().hash();

        let mut block = sample();
        block.previous_hash = None;
        assert_ne!(block.hash(), original);

        let mut block = sample();
        block.transaction.amount = 11.0;
        assert_ne!(block.hash(), original);

        let mut block = sample();
        block.transaction.sender = "someone else".to_string();
        assert_ne!(block.hash(), original);

        let mut block = sample();
        block.transaction.payee = "someone else".to_string();
        assert_ne!(block.hash(), original);

        let mut block = sample();
        block.transaction.amount = f64::INFINITY;
        let infinite = block.hash();
        block.transaction.amount = f64::NEG_INFINITY;
        assert_ne!(block.hash(), infinite);
        block.transaction.amount = f64::NAN;
        assert_ne!(block.hash(), infinite);

        let mut block = sample();
        block.timestamp += 1;
        assert_ne!(block.hash(), original);

        let mut block = sample();
        block.nonce += 1;
        assert_ne!(block.hash(), original);
    }
}
