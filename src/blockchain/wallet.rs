use ed25519_dalek::SigningKey;
use log::debug;

use std::fmt;

use super::block::Block;
use super::chain::{Chain, ChainError};
use super::crypto::{self, CryptoError, DigitalSignature};
use super::transaction::Transaction;

/// A credential pair able to issue signed transactions
///
/// Both keys are kept in their PEM encodings: SPKI for the public key,
/// PKCS#8 for the private key.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    public_key: String,
    private_key: String,
}

impl Wallet {
    /// Creates a new wallet with a freshly generated key pair
    pub fn new() -> Result<Self, CryptoError> {
        let signing_key = crypto::generate_signing_key()?;
        Self::from_signing_key(signing_key)
    }

    /// Restores a wallet from its PKCS#8 PEM private key
    pub fn from_private_key_pem(pem: &str) -> Result<Self, CryptoError> {
        let signing_key = crypto::decode_private_key(pem)?;
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, CryptoError> {
        let public_key = crypto::encode_public_key(&signing_key.verifying_key())?;
        let private_key = crypto::encode_private_key(&signing_key)?;

        Ok(Wallet {
            signing_key,
            public_key,
            private_key,
        })
    }

    /// Gets the wallet's public key (SPKI PEM)
    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// Gets the wallet's private key (PKCS#8 PEM)
    pub fn private_key(&self) -> &str {
        &self.private_key
    }

    /// Signs a message with the wallet's private key
    pub fn sign(&self, message: &[u8]) -> DigitalSignature {
        crypto::sign(&self.signing_key, message)
    }

    /// Signs the canonical bytes of a transaction
    pub fn sign_transaction(&self, transaction: &Transaction) -> DigitalSignature {
        self.sign(&transaction.to_bytes())
    }

    /// Sends `amount` to `payee_public_key` by submitting a signed transaction to `chain`
    ///
    /// # Returns
    ///
    /// The block recording the transfer, or why the chain rejected it
    pub fn send_money(
        &self,
        chain: &Chain,
        amount: f64,
        payee_public_key: &str,
    ) -> Result<Block, ChainError> {
        let transaction = Transaction::new(amount, self.public_key.as_str(), payee_public_key);
        let signature = self.sign_transaction(&transaction);
        debug!("Submitting transfer of {} signed {}", amount, signature);

        chain.add_block(transaction, &self.public_key, &signature)
    }
}

impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::new().unwrap();

        assert!(wallet.public_key().contains("BEGIN PUBLIC KEY"));
        assert!(wallet.private_key().contains("BEGIN PRIVATE KEY"));
        assert_ne!(wallet.public_key(), Wallet::new().unwrap().public_key());
    }

    #[test]
    fn test_restore_from_private_key() {
        let wallet = Wallet::new().unwrap();
        let restored = Wallet::from_private_key_pem(wallet.private_key()).unwrap();

        assert_eq!(restored.public_key(), wallet.public_key());
        assert!(Wallet::from_private_key_pem("garbage").is_err());
    }

    #[test]
    fn test_signing_and_verification() {
        let wallet = Wallet::new().unwrap();
        let message = b"Hello, world!";

        let signature = wallet.sign(message);
        assert!(crypto::verify_signature(message, &signature, wallet.public_key()).unwrap());
        assert!(!crypto::verify_signature(b"Wrong message", &signature, wallet.public_key()).unwrap());
    }

    #[test]
    fn test_debug_hides_private_key() {
        let wallet = Wallet::new().unwrap();

        assert!(!format!("{:?}", wallet).contains("PRIVATE KEY"));
    }

    #[test]
    fn test_send_money() {
        let chain = Chain::with_config(LedgerConfig {
            difficulty: 1,
            ..LedgerConfig::default()
        })
        .unwrap();
        let sender = Wallet::new().unwrap();
        let payee = Wallet::new().unwrap();

        let block = sender.send_money(&chain, 17.0, payee.public_key()).unwrap();

        assert_eq!(chain.len(), 2);
        assert_eq!(block.transaction.amount, 17.0);
        assert_eq!(block.transaction.sender, sender.public_key());
        assert_eq!(block.transaction.payee, payee.public_key());
    }
}
