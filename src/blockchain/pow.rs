//! Proof of work puzzle.
//!
//! A solution `s` for a seed is the smallest `s >= 1` whose MD5 digest of the
//! decimal string of `seed + s` starts with `difficulty` zero hex characters.

use log::debug;
use md5::{Digest, Md5};
use thiserror::Error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Number of hex characters in an MD5 digest
pub const MAX_DIFFICULTY: usize = 32;

/// Attempts between two checks of the clock and the cancel token
const CHECK_INTERVAL: u64 = 1024;

/// Errors that stop a proof of work search
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MiningError {
    #[error("Mining timed out after {attempts} attempts ({elapsed:?})")]
    Timeout { attempts: u64, elapsed: Duration },

    #[error("No solution found within {attempts} attempts")]
    AttemptsExhausted { attempts: u64 },

    #[error("Mining cancelled after {attempts} attempts")]
    Cancelled { attempts: u64 },

    #[error("Nonce space exhausted for seed {seed}")]
    NonceOverflow { seed: u64 },
}

/// Shared flag used to stop a running search from another thread
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every search holding a clone of this token to stop
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether [`CancelToken::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Hex MD5 digest of the decimal representation of `value`
pub fn digest(value: u64) -> String {
    let mut hasher = Md5::new();
    hasher.update(value.to_string().as_bytes());
    hex::encode(hasher.finalize())
}

/// Search parameters for the puzzle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
    max_attempts: Option<u64>,
    timeout: Option<Duration>,
}

impl ProofOfWork {
    /// An unbounded search at the given difficulty
    ///
    /// Difficulties above [`MAX_DIFFICULTY`] are clamped, since a digest can
    /// never have more leading zeros than characters.
    pub fn new(difficulty: usize) -> Self {
        ProofOfWork {
            difficulty: difficulty.min(MAX_DIFFICULTY),
            max_attempts: None,
            timeout: None,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: Option<u64>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Whether `value` satisfies the difficulty target
    pub fn meets_target(&self, value: u64) -> bool {
        digest(value).bytes().take(self.difficulty).all(|b| b == b'0')
    }

    /// Finds the smallest solution for `seed`
    pub fn mine(&self, seed: u64) -> Result<u64, MiningError> {
        self.search(seed, None)
    }

    /// Like [`ProofOfWork::mine`], stopping early once `cancel` is triggered
    pub fn mine_cancellable(&self, seed: u64, cancel: &CancelToken) -> Result<u64, MiningError> {
        self.search(seed, Some(cancel))
    }

    fn search(&self, seed: u64, cancel: Option<&CancelToken>) -> Result<u64, MiningError> {
        let started = Instant::now();
        let mut solution: u64 = 1;

        loop {
            let attempts = solution - 1;

            if attempts % CHECK_INTERVAL == 0 {
                if cancel.is_some_and(CancelToken::is_cancelled) {
                    return Err(MiningError::Cancelled { attempts });
                }
                if let Some(timeout) = self.timeout {
                    let elapsed = started.elapsed();
                    if elapsed >= timeout {
                        return Err(MiningError::Timeout { attempts, elapsed });
                    }
                }
            }
            if self.max_attempts.is_some_and(|max| attempts >= max) {
                return Err(MiningError::AttemptsExhausted { attempts });
            }

            let candidate = seed
                .checked_add(solution)
                .ok_or(MiningError::NonceOverflow { seed })?;

            if self.meets_target(candidate) {
                debug!(
                    "Solved seed {} with solution {} in {:?}",
                    seed,
                    solution,
                    started.elapsed()
                );
                return Ok(solution);
            }

            solution = solution
                .checked_add(1)
                .ok_or(MiningError::NonceOverflow { seed })?;
        }
    }
}

impl Default for ProofOfWork {
    fn default() -> Self {
        ProofOfWork::new(4)
    }
}
