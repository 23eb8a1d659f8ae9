//! Blockchain orchestration for powchain.
//!
//! This crate ties the core primitives together into a working ledger:
//! - **Blockchain**: the chain of sealed blocks, balances and validation
//! - **Mempool**: the pool of transactions waiting for the next block
//!
//! # Example
//!
//! ```rust,no_run
//! use powchain_chain::Blockchain;
//! use powchain_core::Keypair;
//!
//! let mut blockchain = Blockchain::new();
//! let alice = Keypair::generate();
//! let bob = Keypair::generate();
//!
//! // Mine a block to earn the reward, then spend part of it.
//! blockchain.mine_pending_transactions(alice.address());
//! blockchain
//!     .create_transaction(Some(alice.address()), bob.address(), 30, &alice)
//!     .unwrap();
//! blockchain.mine_pending_transactions(bob.address());
//!
//! assert_eq!(blockchain.get_balance_of_address(&alice.address()), 70);
//! assert!(blockchain.is_chain_valid());
//! ```

pub mod blockchain;
pub mod mempool;

// Re-export commonly used types
pub use blockchain::{
    Blockchain, BlockchainConfig, BlockchainError, BlockchainStats, ChainValidationError,
    GENESIS_TIMESTAMP,
};
pub use mempool::{Mempool, MempoolStats};
