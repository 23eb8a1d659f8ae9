//! Pool of pending transactions.
//!
//! The mempool holds submitted transactions, in submission order, until the
//! next block is mined. It performs no balance checks of its own: several
//! pending transfers from one sender may together exceed that sender's
//! confirmed balance.

use powchain_core::{Address, Transaction};
use std::collections::HashSet;

/// Transaction mempool.
#[derive(Debug, Clone, Default)]
pub struct Mempool {
    /// Transactions in submission order.
    transactions: Vec<Transaction>,
}

impl Mempool {
    /// Create an empty mempool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of transactions in the mempool.
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the mempool is empty.
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Append a transaction to the back of the queue.
    pub fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    /// All pending transactions in submission order.
    pub fn as_slice(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Iterate over pending transactions, oldest first.
    pub fn iter(&self) -> std::slice::Iter<'_, Transaction> {
        self.transactions.iter()
    }

    /// Get pending transactions from a specific sender.
    pub fn get_by_sender(&self, sender: &Address) -> Vec<&Transaction> {
        self.iter()
            .filter(|tx| tx.from.as_ref() == Some(sender))
            .collect()
    }

    /// Total amount a sender has queued for transfer.
    pub fn pending_outflow(&self, sender: &Address) -> u64 {
        self.get_by_sender(sender)
            .iter()
            .fold(0u64, |sum, tx| sum.saturating_add(tx.amount))
    }

    /// Remove and return every pending transaction, oldest first.
    pub fn take_all(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Get mempool statistics.
    pub fn stats(&self) -> MempoolStats {
        let senders: HashSet<&Address> =
            self.iter().filter_map(|tx| tx.from.as_ref()).collect();
        MempoolStats {
            total_transactions: self.len(),
            unique_senders: senders.len(),
            total_amount: self
                .iter()
                .fold(0u64, |sum, tx| sum.saturating_add(tx.amount)),
        }
    }
}

/// Mempool statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MempoolStats {
    /// Total number of transactions.
    pub total_transactions: usize,
    /// Number of unique senders (system transactions excluded).
    pub unique_senders: usize,
    /// Sum of all pending amounts.
    pub total_amount: u64,
}
