use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sender of the transaction recorded in the genesis block
pub const GENESIS_SENDER: &str = "genesis";

/// Payee of the transaction recorded in the genesis block
pub const GENESIS_PAYEE: &str = "satoshi";

/// Amount moved by the genesis transaction
pub const GENESIS_AMOUNT: f64 = 100.0;

/// A transfer of value between two public keys
///
/// `sender` and `payee` hold PEM encoded public keys, not account names.
/// No validation is applied to any field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Amount being transferred
    pub amount: f64,

    /// Sender's public key
    pub sender: String,

    /// Payee's public key
    pub payee: String,
}

impl Transaction {
    /// Creates a new transaction
    ///
    /// # Arguments
    ///
    /// * `amount` - The amount to transfer
    /// * `sender` - The public key of the sender
    /// * `payee` - The public key of the payee
    pub fn new(amount: f64, sender: impl Into<String>, payee: impl Into<String>) -> Self {
        Transaction {
            amount,
            sender: sender.into(),
            payee: payee.into(),
        }
    }

    /// The fixed transaction carried by every genesis block
    pub fn genesis() -> Self {
        Transaction::new(GENESIS_AMOUNT, GENESIS_SENDER, GENESIS_PAYEE)
    }

    /// Canonical JSON value, fields in the order `amount`, `sender`, `payee`
    ///
    /// Non-finite amounts have no JSON number form and are written as the
    /// strings `"NaN"`, `"Infinity"` and `"-Infinity"`.
    pub fn canonical_value(&self) -> Value {
        serde_json::json!({
            "amount": canonical_amount(self.amount),
            "sender": self.sender,
            "payee": self.payee,
        })
    }

    /// The exact bytes that are signed and hashed for this transaction
    pub fn to_bytes(&self) -> Vec<u8> {
        self.canonical_value().to_string().into_bytes()
    }
}

fn canonical_amount(amount: f64) -> Value {
    if amount.is_nan() {
        Value::from("NaN")
    } else if amount == f64::INFINITY {
        Value::from("Infinity")
    } else if amount == f64::NEG_INFINITY {
        Value::from("-Infinity")
    } else {
        Value::from(amount)
    }
}
