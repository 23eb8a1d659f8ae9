//! Blocks and proof-of-work sealing.

use crate::crypto::{Address, SignatureVerifier};
use crate::hash::{hash_concat, Hash};
use crate::merkle::merkle_root;
use crate::transaction::{Result as TxResult, Transaction};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A container of transactions linked to its predecessor by hash.
///
/// Fields are only reachable through accessors: once a block is sealed by
/// [`Block::mine_block`] its contents are read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Unix timestamp in milliseconds.
    timestamp: u64,
    /// Transactions, in hashing order.
    transactions: Vec<Transaction>,
    /// Hash of the previous block, [`Hash::ZERO`] for genesis.
    previous_hash: Hash,
    /// Required number of leading zero hex digits in `hash`.
    difficulty: u32,
    /// Proof-of-work search counter.
    nonce: u64,
    /// Digest over the header fields and the nonce.
    hash: Hash,
    /// Merkle root of `transactions`.
    merkle_root: Hash,
}

impl Block {
    /// Create an unsealed block. The nonce starts at zero.
    pub fn new(
        timestamp: u64,
        transactions: Vec<Transaction>,
        previous_hash: Hash,
        difficulty: u32,
    ) -> Self {
        let merkle_root = merkle_root(&transactions);
        let mut block = Self {
            timestamp,
            transactions,
            previous_hash,
            difficulty,
            nonce: 0,
            hash: Hash::ZERO,
            merkle_root,
        };
        block.hash = block.calculate_hash();
        block
    }

    /// Create the genesis block: a single grant to `address`, no predecessor,
    /// difficulty zero.
    pub fn genesis(address: Address, amount: u64, timestamp: u64) -> Self {
        let grant = Transaction::with_timestamp(None, address, amount, timestamp);
        Self::new(timestamp, vec![grant], Hash::ZERO, 0)
    }

    /// Recompute the block hash from the current contents.
    pub fn calculate_hash(&self) -> Hash {
        hash_with_nonce(&self.preimage_prefix(), self.nonce)
    }

    /// Everything hashed except the nonce: previous hash, timestamp and the
    /// serialized transaction list.
    fn preimage_prefix(&self) -> Vec<u8> {
        let encoded_txs =
            bincode::serialize(&self.transactions).expect("serialization should not fail");
        let mut bytes = Vec::with_capacity(32 + 8 + encoded_txs.len());
        bytes.extend_from_slice(self.previous_hash.as_bytes());
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        bytes.extend_from_slice(&encoded_txs);
        bytes
    }

    /// Check whether the stored hash satisfies the difficulty target.
    pub fn meets_difficulty(&self) -> bool {
        self.hash.leading_zero_hex_digits() >= self.difficulty
    }

    /// Search nonces one at a time until the hash meets the difficulty target.
    ///
    /// Expected work grows by a factor of 16 per difficulty step.
    pub fn mine_block(&mut self) {
        let prefix = self.preimage_prefix();
        while self.hash.leading_zero_hex_digits() < self.difficulty {
            self.nonce = self.nonce.wrapping_add(1);
            self.hash = hash_with_nonce(&prefix, self.nonce);
        }

        info!(
            "Block mined: {} (nonce {}, difficulty {})",
            self.hash, self.nonce, self.difficulty
        );
    }

    /// Search the nonce space on all rayon worker threads.
    ///
    /// Each worker hashes its own candidates; the first qualifying nonce wins,
    /// the remaining search is abandoned and the block is updated once.
    pub fn mine_block_parallel(&mut self) {
        let prefix = self.preimage_prefix();
        let difficulty = self.difficulty;

        let (nonce, hash) = (0u64..u64::MAX)
            .into_par_iter()
            .map(|nonce| (nonce, hash_with_nonce(&prefix, nonce)))
            .find_any(|(_, hash)| hash.leading_zero_hex_digits() >= difficulty)
            .expect("nonce space exhausted (practically impossible)");

        self.nonce = nonce;
        self.hash = hash;

        info!(
            "Block mined in parallel: {} (nonce {}, difficulty {})",
            self.hash, self.nonce, self.difficulty
        );
    }

    /// Check every transaction's signature, stopping at the first invalid one.
    ///
    /// A missing signature is returned as an error rather than `false`.
    pub fn has_valid_transactions<V: SignatureVerifier + ?Sized>(
        &self,
        verifier: &V,
    ) -> TxResult<bool> {
        for (index, tx) in self.transactions.iter().enumerate() {
            if !tx.is_valid(verifier)? {
                debug!("transaction {} in block {} is invalid", index, self.hash);
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Check that the stored merkle root matches the current transactions.
    pub fn verify_merkle_root(&self) -> bool {
        merkle_root(&self.transactions) == self.merkle_root
    }

    /// Overwrite the amount of an embedded transaction without resealing.
    ///
    /// Returns the previous amount, or `None` if there is no such transaction.
    #[cfg(any(test, feature = "simulate-corruption"))]
    pub fn simulate_corruption(&mut self, tx_index: usize, amount: u64) -> Option<u64> {
        let tx = self.transactions.get_mut(tx_index)?;
        Some(std::mem::replace(&mut tx.amount, amount))
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn previous_hash(&self) -> Hash {
        self.previous_hash
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn hash(&self) -> Hash {
        self.hash
    }

    pub fn merkle_root(&self) -> Hash {
        self.merkle_root
    }

    /// Get the number of transactions in this block.
    pub fn tx_count(&self) -> usize {
        self.transactions.len()
    }

    /// Check if this is a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.previous_hash == Hash::ZERO
    }
}

fn hash_with_nonce(prefix: &[u8], nonce: u64) -> Hash {
    hash_concat(&[prefix, &nonce.to_le_bytes()])
}
