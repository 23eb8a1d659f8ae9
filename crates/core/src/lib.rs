//! Core ledger primitives for powchain.
//!
//! This crate provides the building blocks of the ledger:
//! - SHA-256 hashing
//! - Ed25519 key pairs, addresses and signature verification
//! - Signed transactions
//! - Merkle trees over transactions
//! - Blocks and proof-of-work sealing

pub mod block;
pub mod crypto;
pub mod hash;
pub mod merkle;
pub mod transaction;

// Re-export commonly used types at the crate root
pub use block::Block;
pub use crypto::{Address, CryptoError, Ed25519Verifier, Keypair, Signature, SignatureVerifier};
pub use hash::{hash_concat, sha256, Hash, H256};
pub use merkle::{merkle_root, verify_proof, MerkleProof, MerkleTree};
pub use transaction::{current_timestamp_millis, Transaction, TransactionError};
