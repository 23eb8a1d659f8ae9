//! Transfer records and their signatures.

use crate::crypto::{Address, Keypair, Signature, SignatureVerifier};
use crate::hash::{sha256, Hash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during transaction operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransactionError {
    #[error("key for {signer:?} cannot sign transactions sent from {from:?}")]
    Unauthorized {
        signer: Address,
        from: Option<Address>,
    },
    #[error("transaction has no signature")]
    MissingSignature,
}

pub type Result<T> = std::result::Result<T, TransactionError>;

/// A transfer of `amount` from one address to another.
///
/// A transaction without a sender is issued by the system (mining rewards and
/// the genesis grant) and needs no signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Sender address, `None` for system issuance.
    pub from: Option<Address>,
    /// Recipient address.
    pub to: Address,
    /// Value to transfer.
    pub amount: u64,
    /// Creation time in Unix milliseconds.
    pub timestamp: u64,
    /// Sender's signature over [`Transaction::content_hash`].
    pub signature: Option<Signature>,
}

/// The fields covered by the content hash, in canonical order.
#[derive(Serialize)]
struct TransactionContent<'a> {
    from: &'a Option<Address>,
    to: &'a Address,
    amount: u64,
    timestamp: u64,
}

impl Transaction {
    /// Create a new unsigned transaction stamped with the current time.
    pub fn new(from: Option<Address>, to: Address, amount: u64) -> Self {
        Self::with_timestamp(from, to, amount, current_timestamp_millis())
    }

    /// Create a new unsigned transaction with an explicit timestamp.
    pub fn with_timestamp(from: Option<Address>, to: Address, amount: u64, timestamp: u64) -> Self {
        Self {
            from,
            to,
            amount,
            timestamp,
            signature: None,
        }
    }

    /// Create a system-issued transaction crediting `to`.
    pub fn reward(to: Address, amount: u64) -> Self {
        Self::new(None, to, amount)
    }

    /// Check if this transaction was issued by the system.
    pub fn is_system(&self) -> bool {
        self.from.is_none()
    }

    /// Digest of (from, to, amount, timestamp).
    ///
    /// This is the signed message and the transaction's identifier.
    pub fn content_hash(&self) -> Hash {
        let content = TransactionContent {
            from: &self.from,
            to: &self.to,
            amount: self.amount,
            timestamp: self.timestamp,
        };
        let encoded = bincode::serialize(&content).expect("serialization should not fail");
        sha256(&encoded)
    }

    /// Sign the transaction. Only the key behind `from` may sign.
    pub fn sign(&mut self, keypair: &Keypair) -> Result<()> {
        let signer = keypair.address();
        if self.from != Some(signer) {
            return Err(TransactionError::Unauthorized {
                signer,
                from: self.from,
            });
        }

        let hash = self.content_hash();
        self.signature = Some(keypair.sign(hash.as_bytes()));
        Ok(())
    }

    /// Sign and return the transaction.
    pub fn signed(mut self, keypair: &Keypair) -> Result<Self> {
        self.sign(keypair)?;
        Ok(self)
    }

    /// Check the transaction's authenticity.
    ///
    /// System transactions are always valid. Otherwise the signature must be
    /// present and verify against the sender address.
    pub fn is_valid<V: SignatureVerifier + ?Sized>(&self, verifier: &V) -> Result<bool> {
        let Some(from) = self.from else {
            return Ok(true);
        };
        let signature = self.signature.ok_or(TransactionError::MissingSignature)?;
        Ok(verifier.verify(&from, self.content_hash().as_bytes(), &signature))
    }

    /// Check if `address` is the sender or the recipient.
    pub fn involves(&self, address: &Address) -> bool {
        self.from.as_ref() == Some(address) || &self.to == address
    }
}

/// Current Unix time in milliseconds.
pub fn current_timestamp_millis() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
