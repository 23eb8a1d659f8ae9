//! Main blockchain orchestration.
//!
//! This module owns the chain of sealed blocks and the pending pool, and
//! derives balances by replaying the chain from genesis.

use crate::mempool::Mempool;
use powchain_core::{
    current_timestamp_millis, sha256, Address, Block, Ed25519Verifier, Hash, Keypair,
    SignatureVerifier, Transaction, TransactionError,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("transfers require a sender address")]
    InvalidSender,

    #[error("insufficient funds (required {required}, available {available})")]
    InsufficientFunds { required: u64, available: i128 },

    #[error("transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("cannot add invalid transaction to chain")]
    InvalidTransaction,

    #[error("block index {index} out of range (chain length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, BlockchainError>;

/// The first check a block failed during chain validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainValidationError {
    #[error("block {index}: merkle root does not match transactions")]
    InvalidMerkleRoot { index: usize },

    #[error("block {index}: contains invalid transactions")]
    InvalidTransactions { index: usize },

    #[error("block {index}: contains an unsigned transfer")]
    MissingSignature { index: usize },

    #[error("block {index}: stored hash does not match contents")]
    HashMismatch { index: usize },

    #[error("block {index}: previous hash does not match the preceding block")]
    BrokenLink { index: usize },
}

/// Genesis timestamp: 2023-01-01T00:00:00Z in milliseconds.
pub const GENESIS_TIMESTAMP: u64 = 1_672_531_200_000;

/// Blockchain configuration.
#[derive(Debug, Clone)]
pub struct BlockchainConfig {
    /// Amount credited to the miner of each block.
    pub mining_reward: u64,
    /// Recipient of the genesis grant.
    pub genesis_address: Address,
    /// Amount of the genesis grant.
    pub genesis_amount: u64,
    /// Timestamp of the genesis block and its grant.
    pub genesis_timestamp: u64,
    /// Difficulty of the first mined block.
    pub initial_difficulty: u32,
    /// Search nonces on all cores instead of one.
    pub parallel_mining: bool,
}

impl BlockchainConfig {
    /// The default genesis address. It is not an ed25519 key anyone holds, so
    /// the grant can never be spent.
    pub fn default_genesis_address() -> Address {
        Address::from_bytes(sha256(b"genesis-wallet").0)
    }
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            mining_reward: 100,
            genesis_address: Self::default_genesis_address(),
            genesis_amount: 1000,
            genesis_timestamp: GENESIS_TIMESTAMP,
            initial_difficulty: 0,
            parallel_mining: false,
        }
    }
}

/// A single linear chain of proof-of-work blocks plus its pending pool.
#[derive(Debug, Clone)]
pub struct Blockchain<V: SignatureVerifier = Ed25519Verifier> {
    /// Sealed blocks; index 0 is genesis and the chain is never empty.
    chain: Vec<Block>,
    /// Transactions waiting for the next block.
    mempool: Mempool,
    /// Difficulty of the next mined block.
    difficulty: u32,
    /// Configuration.
    config: BlockchainConfig,
    /// Signature verification service.
    verifier: V,
}

impl Blockchain {
    /// Create a new blockchain with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BlockchainConfig::default())
    }

    /// Create a new blockchain with the given configuration.
    pub fn with_config(config: BlockchainConfig) -> Self {
        Self::with_verifier(config, Ed25519Verifier)
    }
}

impl Default for Blockchain {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: SignatureVerifier> Blockchain<V> {
    /// Create a new blockchain that checks signatures with `verifier`.
    pub fn with_verifier(config: BlockchainConfig, verifier: V) -> Self {
        let genesis = Block::genesis(
            config.genesis_address,
            config.genesis_amount,
            config.genesis_timestamp,
        );

        Self {
            chain: vec![genesis],
            mempool: Mempool::new(),
            difficulty: config.initial_difficulty,
            config,
            verifier,
        }
    }

    /// Get the most recently sealed block.
    pub fn get_latest_block(&self) -> &Block {
        &self.chain[self.chain.len() - 1]
    }

    /// Sign and queue a transfer.
    ///
    /// The sender must hold at least `amount` in confirmed balance. Amounts
    /// already queued by the same sender are not taken into account.
    pub fn create_transaction(
        &mut self,
        from: Option<Address>,
        to: Address,
        amount: u64,
        keypair: &Keypair,
    ) -> Result<Transaction> {
        let from = from.ok_or(BlockchainError::InvalidSender)?;

        let available = self.get_balance_of_address(&from);
        if available < i128::from(amount) {
            return Err(BlockchainError::InsufficientFunds {
                required: amount,
                available,
            });
        }

        let tx = Transaction::new(Some(from), to, amount).signed(keypair)?;
        if !tx.is_valid(&self.verifier)? {
            return Err(BlockchainError::InvalidTransaction);
        }

        debug!(
            "queued transaction {} ({} -> {}, amount {})",
            tx.content_hash(),
            from.short(),
            to.short(),
            amount
        );
        self.mempool.push(tx.clone());
        Ok(tx)
    }

    /// Seal every pending transaction plus a reward for `miner` into a new
    /// block and append it.
    ///
    /// Blocks the caller until proof-of-work completes.
    pub fn mine_pending_transactions(&mut self, miner: Address) -> &Block {
        let mut transactions = self.mempool.take_all();
        transactions.push(Transaction::reward(miner, self.config.mining_reward));

        let mut block = Block::new(
            current_timestamp_millis(),
            transactions,
            self.get_latest_block().hash(),
            self.difficulty,
        );

        if self.config.parallel_mining {
            block.mine_block_parallel();
        } else {
            block.mine_block();
        }

        info!(
            "appended block {} with {} transactions",
            self.chain.len(),
            block.tx_count()
        );
        self.chain.push(block);
        self.adjust_difficulty();

        self.get_latest_block()
    }

    fn adjust_difficulty(&mut self) {
        self.difficulty += 1;
        info!("Difficulty incremented to: {}", self.difficulty);
    }

    /// Set the difficulty of the next block back to zero.
    pub fn reset_difficulty(&mut self) {
        self.difficulty = 0;
        info!("Difficulty reset to 0");
    }

    /// Net balance of `address`, replayed from genesis.
    pub fn get_balance_of_address(&self, address: &Address) -> i128 {
        self.get_transactions_for_address(address)
            .into_iter()
            .fold(0i128, |mut balance, tx| {
                if tx.from.as_ref() == Some(address) {
                    balance -= i128::from(tx.amount);
                }
                if &tx.to == address {
                    balance += i128::from(tx.amount);
                }
                balance
            })
    }

    /// Every confirmed transaction sent or received by `address`, in chain order.
    pub fn get_transactions_for_address(&self, address: &Address) -> Vec<&Transaction> {
        self.chain
            .iter()
            .flat_map(|block| block.transactions())
            .filter(|tx| tx.involves(address))
            .collect()
    }

    /// Check every non-genesis block, reporting the first failure.
    ///
    /// For each block: merkle root, transaction signatures, stored hash, then
    /// the link to its predecessor.
    pub fn validate_chain(&self) -> std::result::Result<(), ChainValidationError> {
        for (index, pair) in self.chain.windows(2).enumerate() {
            let index = index + 1;
            let (previous, current) = (&pair[0], &pair[1]);

            if !current.verify_merkle_root() {
                return Err(ChainValidationError::InvalidMerkleRoot { index });
            }

            match current.has_valid_transactions(&self.verifier) {
                Ok(true) => {}
                Ok(false) => return Err(ChainValidationError::InvalidTransactions { index }),
                Err(_) => return Err(ChainValidationError::MissingSignature { index }),
            }

            if current.hash() != current.calculate_hash() {
                return Err(ChainValidationError::HashMismatch { index });
            }

            if current.previous_hash() != previous.hash() {
                return Err(ChainValidationError::BrokenLink { index });
            }
        }
        Ok(())
    }

    /// Check whether the whole chain is intact.
    pub fn is_chain_valid(&self) -> bool {
        match self.validate_chain() {
            Ok(()) => true,
            Err(e) => {
                warn!("chain validation failed: {}", e);
                false
            }
        }
    }

    /// Get a block by its position in the chain.
    pub fn get_block_by_index(&self, index: usize) -> Result<&Block> {
        self.chain
            .get(index)
            .ok_or(BlockchainError::IndexOutOfRange {
                index,
                len: self.chain.len(),
            })
    }

    /// Find a block by its hash.
    pub fn get_block_by_hash(&self, hash: &Hash) -> Option<&Block> {
        self.chain.iter().find(|block| &block.hash() == hash)
    }

    /// Find a confirmed transaction by its content hash.
    pub fn get_transaction_by_hash(&self, hash: &Hash) -> Option<&Transaction> {
        self.chain
            .iter()
            .flat_map(|block| block.transactions())
            .find(|tx| &tx.content_hash() == hash)
    }

    /// All sealed blocks, genesis first.
    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: the chain holds at least the genesis block.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Transactions waiting for the next block, in submission order.
    pub fn pending_transactions(&self) -> &[Transaction] {
        self.mempool.as_slice()
    }

    /// The pending pool.
    pub fn mempool(&self) -> &Mempool {
        &self.mempool
    }

    /// Difficulty of the next block to be mined.
    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn mining_reward(&self) -> u64 {
        self.config.mining_reward
    }

    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }

    /// Sum of 2^difficulty over every block.
    pub fn total_difficulty(&self) -> u128 {
        self.chain.iter().fold(0u128, |total, block| {
            let work = 1u128.checked_shl(block.difficulty()).unwrap_or(u128::MAX);
            total.saturating_add(work)
        })
    }

    /// Overwrite a confirmed transaction's amount in place.
    ///
    /// Returns the previous amount, or `None` if the position does not exist.
    #[cfg(any(test, feature = "simulate-corruption"))]
    pub fn simulate_corruption(
        &mut self,
        block_index: usize,
        tx_index: usize,
        amount: u64,
    ) -> Option<u64> {
        self.chain
            .get_mut(block_index)?
            .simulate_corruption(tx_index, amount)
    }

    /// Get blockchain statistics.
    pub fn stats(&self) -> BlockchainStats {
        let latest = self.get_latest_block();
        BlockchainStats {
            height: (self.chain.len() - 1) as u64,
            latest_block_hash: latest.hash(),
            latest_timestamp: latest.timestamp(),
            difficulty: self.difficulty,
            total_difficulty: self.total_difficulty(),
            pending_transactions: self.mempool.len(),
        }
    }
}

/// Blockchain statistics.
#[derive(Debug, Clone)]
pub struct BlockchainStats {
    /// Index of the latest block.
    pub height: u64,
    /// Hash of the latest block.
    pub latest_block_hash: Hash,
    /// Timestamp of the latest block.
    pub latest_timestamp: u64,
    /// Difficulty of the next block.
    pub difficulty: u32,
    /// Accumulated work of the chain.
    pub total_difficulty: u128,
    /// Number of pending transactions.
    pub pending_transactions: usize,
}
