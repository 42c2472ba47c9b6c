use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use super::block::{Block, MAX_NONCE_SEED};
use super::crypto::{verify_signature, CryptoError, DigitalSignature};
use super::pow::{CancelToken, MiningError, ProofOfWork};
use super::transaction::Transaction;
use crate::config::{ConfigError, LedgerConfig};

/// Reasons a block is rejected or a chain fails verification
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Signer public key does not match the transaction sender")]
    SenderMismatch,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Mining error: {0}")]
    Mining(#[from] MiningError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid chain: {0}")]
    InvalidChain(String),
}

/// Blocks and the generator for their nonce seeds, guarded together
#[derive(Debug)]
struct Ledger {
    /// Never empty: holds the genesis block from construction on
    blocks: Vec<Block>,
    nonces: StdRng,
}

impl Ledger {
    fn next_nonce(&mut self) -> u64 {
        self.nonces.gen_range(0..=MAX_NONCE_SEED)
    }

    fn last(&self) -> &Block {
        &self.blocks[self.blocks.len() - 1]
    }
}

/// Append-only chain of blocks
///
/// Admissions are serialized by their own lock, held from reading the last
/// block's hash until the new block is appended, so every block links to its
/// true predecessor. The ledger lock is only taken for short reads and the
/// append, so readers never wait on a proof of work search.
#[derive(Debug)]
pub struct Chain {
    admission: Mutex<()>,
    ledger: Mutex<Ledger>,
    config: LedgerConfig,
    pow: ProofOfWork,
}

impl Chain {
    /// Creates a new chain with a genesis block and the default config
    pub fn new() -> Self {
        Self::build(LedgerConfig::default())
    }

    /// Creates a new chain with a genesis block
    pub fn with_config(config: LedgerConfig) -> Result<Self, ChainError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: LedgerConfig) -> Self {
        let nonces = match config.nonce_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut ledger = Ledger {
            blocks: Vec::new(),
            nonces,
        };

        let seed = ledger.next_nonce();
        ledger
            .blocks
            .push(Block::with_nonce(None, Transaction::genesis(), seed));

        Chain {
            admission: Mutex::new(()),
            ledger: Mutex::new(ledger),
            pow: config.proof_of_work(),
            config,
        }
    }

    /// The process-wide chain, created with the default config on first use
    pub fn instance() -> &'static Chain {
        static INSTANCE: OnceLock<Chain> = OnceLock::new();
        INSTANCE.get_or_init(Chain::new)
    }

    // A panic while holding the lock cannot leave a half-appended block
    // behind, so a poisoned ledger is still consistent.
    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Gets the last block in the chain
    pub fn last_block(&self) -> Block {
        self.ledger().last().clone()
    }

    /// Number of blocks, genesis included
    pub fn len(&self) -> usize {
        self.ledger().blocks.len()
    }

    /// Always false: the genesis block is never removed
    pub fn is_empty(&self) -> bool {
        self.ledger().blocks.is_empty()
    }

    /// Snapshot of every block in order
    pub fn blocks(&self) -> Vec<Block> {
        self.ledger().blocks.clone()
    }

    /// Runs the proof of work search for `seed` under this chain's policy
    pub fn mine(&self, seed: u64) -> Result<u64, MiningError> {
        self.pow.mine(seed)
    }

    /// Verifies, mines and appends a block holding `transaction`
    ///
    /// # Arguments
    ///
    /// * `transaction` - The transaction to record
    /// * `sender_public_key` - PEM public key of the signer, must equal `transaction.sender`
    /// * `signature` - Signature over the transaction's canonical bytes
    ///
    /// # Returns
    ///
    /// The appended block, or the reason for rejection. A rejected
    /// transaction leaves the chain untouched.
    pub fn add_block(
        &self,
        transaction: Transaction,
        sender_public_key: &str,
        signature: &DigitalSignature,
    ) -> Result<Block, ChainError> {
        self.admit(transaction, sender_public_key, signature, None)
    }

    /// Like [`Chain::add_block`], abandoning the admission if `cancel` fires while mining
    pub fn add_block_cancellable(
        &self,
        transaction: Transaction,
        sender_public_key: &str,
        signature: &DigitalSignature,
        cancel: &CancelToken,
    ) -> Result<Block, ChainError> {
        self.admit(transaction, sender_public_key, signature, Some(cancel))
    }

    fn admit(
        &self,
        transaction: Transaction,
        sender_public_key: &str,
        signature: &DigitalSignature,
        cancel: Option<&CancelToken>,
    ) -> Result<Block, ChainError> {
        if transaction.sender != sender_public_key {
            warn!("Rejected transaction of {}: signer is not the sender", transaction.amount);
            return Err(ChainError::SenderMismatch);
        }

        let verified = verify_signature(&transaction.to_bytes(), signature, sender_public_key)
            .inspect_err(|err| warn!("Rejected transaction of {}: {}", transaction.amount, err))?;
        if !verified {
            warn!("Rejected transaction of {}: invalid signature", transaction.amount);
            return Err(ChainError::InvalidSignature);
        }

        // Only admissions append, so the last block stays put while this is held
        let _admission = self.admission.lock().unwrap_or_else(PoisonError::into_inner);
        let (previous_hash, seed) = {
            let mut ledger = self.ledger();
            (ledger.last().hash(), ledger.next_nonce())
        };
        let mut block = Block::with_nonce(Some(previous_hash), transaction, seed);

        let solution = match cancel {
            Some(cancel) => self.pow.mine_cancellable(seed, cancel),
            None => self.pow.mine(seed),
        }
        .inspect_err(|err| warn!("Abandoned block: {}", err))?;

        // Stored nonce is the solved value, so the proof can be rechecked from the block alone
        block.nonce = seed + solution;
        let mut ledger = self.ledger();
        ledger.blocks.push(block.clone());

        info!(
            "Admitted block {} with hash {}",
            ledger.blocks.len() - 1,
            block.hash()
        );

        Ok(block)
    }

    /// Checks the genesis block, every link and every proof of work
    pub fn verify(&self) -> Result<(), ChainError> {
        let ledger = self.ledger();

        let genesis = ledger
            .blocks
            .first()
            .ok_or_else(|| ChainError::InvalidChain("chain has no blocks".to_string()))?;

        if !genesis.is_genesis() {
            return Err(ChainError::InvalidChain(
                "genesis block has a previous hash".to_string(),
            ));
        }

        if genesis.transaction != Transaction::genesis() {
            return Err(ChainError::InvalidChain(
                "genesis block holds the wrong transaction".to_string(),
            ));
        }

        for (index, pair) in ledger.blocks.windows(2).enumerate() {
            let (previous_block, current_block) = (&pair[0], &pair[1]);
            let height = index + 1;

            if current_block.previous_hash.as_deref() != Some(previous_block.hash().as_str()) {
                return Err(ChainError::InvalidChain(format!(
                    "block {} does not link to block {}",
                    height, index
                )));
            }

            if !self.pow.meets_target(current_block.nonce) {
                return Err(ChainError::InvalidChain(format!(
                    "block {} fails proof of work",
                    height
                )));
            }
        }

        Ok(())
    }

    /// Validates the blockchain
    pub fn is_valid(&self) -> bool {
        self.verify().is_ok()
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}
