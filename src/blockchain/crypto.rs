use ed25519_dalek::pkcs8::spki::der::pem::LineEnding;
use ed25519_dalek::pkcs8::spki::{DecodePublicKey, EncodePublicKey};
use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Failed to generate credential pair: {0}")]
    CredentialGeneration(String),

    #[error("Failed to encode key: {0}")]
    KeyEncoding(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// A detached signature over a message, kept as raw bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalSignature(pub Vec<u8>);

impl DigitalSignature {
    /// Wraps a signature produced by a signing key
    pub fn from_signature(signature: &Signature) -> Self {
        DigitalSignature(signature.to_bytes().to_vec())
    }

    /// Converts the raw bytes back to a signature
    pub fn to_signature(&self) -> Result<Signature, CryptoError> {
        Signature::from_slice(&self.0).map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Base58 text form of the signature
    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }
}

impl fmt::Display for DigitalSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl FromStr for DigitalSignature {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CryptoError::DecodingError(e.to_string()))?;

        Ok(DigitalSignature(bytes))
    }
}

/// Generates a fresh signing key from the operating system's entropy source
///
/// Entropy failures are reported instead of panicking so wallet construction
/// can hand them to its caller.
pub fn generate_signing_key() -> Result<SigningKey, CryptoError> {
    let mut secret = [0u8; SECRET_KEY_LENGTH];
    OsRng
        .try_fill_bytes(&mut secret)
        .map_err(|e| CryptoError::CredentialGeneration(e.to_string()))?;

    Ok(SigningKey::from_bytes(&secret))
}

/// Encodes a public key as an SPKI PEM document
pub fn encode_public_key(public_key: &VerifyingKey) -> Result<String, CryptoError> {
    public_key
        .to_public_key_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))
}

/// Encodes a private key as a PKCS#8 PEM document
pub fn encode_private_key(signing_key: &SigningKey) -> Result<String, CryptoError> {
    let pem = signing_key
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| CryptoError::KeyEncoding(e.to_string()))?;

    Ok(pem.as_str().to_owned())
}

/// Parses an SPKI PEM public key
pub fn decode_public_key(pem: &str) -> Result<VerifyingKey, CryptoError> {
    VerifyingKey::from_public_key_pem(pem).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Parses a PKCS#8 PEM private key
pub fn decode_private_key(pem: &str) -> Result<SigningKey, CryptoError> {
    SigningKey::from_pkcs8_pem(pem).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))
}

/// Signs a message with a private key
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> DigitalSignature {
    DigitalSignature::from_signature(&signing_key.sign(message))
}

/// Verifies a signature against a message and a PEM encoded public key
///
/// A well-formed signature that does not match yields `Ok(false)`; malformed
/// keys or signatures are errors.
pub fn verify_signature(
    message: &[u8],
    signature: &DigitalSignature,
    public_key_pem: &str,
) -> Result<bool, CryptoError> {
    let public_key = decode_public_key(public_key_pem)?;
    let signature = signature.to_signature()?;

    match public_key.verify(message, &signature) {
        Ok(_) => Ok(true),
        Err(_) => Ok(false),
    }
}
