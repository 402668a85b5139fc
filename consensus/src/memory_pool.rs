// Copyright (C) 2024-2026 The Nilotic Network Developers.
// This file is part of the nilotic library.

// The nilotic library is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// The nilotic library is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.

// You should have received a copy of the GNU General Public License
// along with the nilotic library. If not, see <https://www.gnu.org/licenses/>.

use crate::{ConsensusError, RateLimiter};
use nilotic_objects::{timestamp_now, Transaction};
use nilotic_storage::Ledger;

use std::collections::{HashSet, VecDeque};

/// The FIFO queue of accepted but unmined transactions.
///
/// The pool is not synchronized; the owning node wraps it in a mutex and
/// may pair that mutex with a condition variable to wake waiting workers.
#[derive(Debug, Default)]
pub struct MemoryPool {
    entries: VecDeque<Transaction>,
    known: HashSet<String>,
    rate_limiter: RateLimiter,
}

impl MemoryPool {
    /// Creates an empty pool with the default submission rate limit.
    pub fn new() -> Self {
        Self {
            entries: VecDeque::new(),
            known: HashSet::new(),
            rate_limiter: RateLimiter::default(),
        }
    }

    /// Accepts a transaction into the queue.
    ///
    /// Rejected submissions leave the queue untouched: structural validity,
    /// coinbase exclusion, duplicate hashes, the sender's current balance,
    /// and the per-sender rate limit are all checked up front.
    pub fn insert(&mut self, ledger: &Ledger, transaction: Transaction) -> Result<(), ConsensusError> {
        if transaction.is_coinbase() {
            return Err(ConsensusError::InvalidTransaction(transaction.hash));
        }
        if !transaction.is_valid() {
            return Err(ConsensusError::InvalidTransaction(transaction.hash));
        }
        if self.known.contains(&transaction.hash) || ledger.contains_transaction(&transaction.hash) {
            return Err(ConsensusError::DuplicateTransaction(transaction.hash));
        }
        if !self.rate_limiter.check(&transaction.sender, timestamp_now()) {
            return Err(ConsensusError::RateLimited(transaction.sender));
        }
        if !transaction.is_contract_deployment() {
            let available = ledger.balance_of(&transaction.sender);
            if available < transaction.amount {
                return Err(ConsensusError::InsufficientFunds {
                    address: transaction.sender,
                    available,
                    required: transaction.amount,
                });
            }
        }

        trace!("pooled transaction {}", transaction.hash);
        self.known.insert(transaction.hash.clone());
        self.entries.push_back(transaction);
        Ok(())
    }

    /// Returns up to `max` transactions from the front of the queue without
    /// removing them; the miner prunes them once their block is accepted.
    pub fn candidates(&self, max: usize) -> Vec<Transaction> {
        self.entries.iter().take(max).cloned().collect()
    }

    /// Removes the transaction with the given hash, if queued.
    pub fn remove(&mut self, hash: &str) -> Option<Transaction> {
        if !self.known.remove(hash) {
            return None;
        }
        let position = self.entries.iter().position(|tx| tx.hash == hash)?;
        self.entries.remove(position)
    }

    /// Returns the queued transactions in order. Used for snapshots.
    pub fn transactions(&self) -> Vec<Transaction> {
        self.entries.iter().cloned().collect()
    }

    /// Restores a queue from a snapshot, bypassing submission gates.
    pub fn restore(&mut self, transactions: Vec<Transaction>) {
        for tx in transactions {
            self.known.insert(tx.hash.clone());
            self.entries.push_back(tx);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilotic_objects::GENESIS_ADDRESS;

    fn signed(sender: &str, recipient: &str, amount: f64) -> Transaction {
        let mut tx = Transaction::new(sender, recipient, amount);
        tx.sign(&format!("{}-key", sender));
        tx
    }

    #[test]
    fn accepts_a_funded_signed_transfer() {
        let ledger = Ledger::new();
        let mut pool = MemoryPool::new();
        pool.insert(&ledger, signed(GENESIS_ADDRESS, "bob", 10.0)).unwrap();
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn rejects_unsigned_coinbase_and_duplicate_submissions() {
        let ledger = Ledger::new();
        let mut pool = MemoryPool::new();

        let unsigned = Transaction::new(GENESIS_ADDRESS, "bob", 1.0);
        assert!(matches!(
            pool.insert(&ledger, unsigned),
            Err(ConsensusError::InvalidTransaction(_))
        ));

        let coinbase = Transaction::coinbase("bob", 1.0);
        assert!(matches!(
            pool.insert(&ledger, coinbase),
            Err(ConsensusError::InvalidTransaction(_))
        ));

        let tx = signed(GENESIS_ADDRESS, "bob", 1.0);
        pool.insert(&ledger, tx.clone()).unwrap();
        assert!(matches!(
            pool.insert(&ledger, tx),
            Err(ConsensusError::DuplicateTransaction(_))
        ));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn rejects_an_overdraft_and_leaves_the_queue_unchanged() {
        let ledger = Ledger::new();
        let mut pool = MemoryPool::new();
        pool.insert(&ledger, signed(GENESIS_ADDRESS, "bob", 10.0)).unwrap();

        let overdraft = signed("bob", "dave", 50.0);
        assert!(matches!(
            pool.insert(&ledger, overdraft),
            Err(ConsensusError::InsufficientFunds { .. })
        ));
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn candidates_preserve_fifo_order_and_leave_the_queue() {
        let ledger = Ledger::new();
        let mut pool = MemoryPool::new();
        let first = signed(GENESIS_ADDRESS, "bob", 1.0);
        let second = signed(GENESIS_ADDRESS, "carol", 2.0);
        pool.insert(&ledger, first.clone()).unwrap();
        pool.insert(&ledger, second.clone()).unwrap();

        let candidates = pool.candidates(10);
        assert_eq!(candidates, vec![first, second]);
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn remove_prunes_a_mined_transaction() {
        let ledger = Ledger::new();
        let mut pool = MemoryPool::new();
        let tx = signed(GENESIS_ADDRESS, "bob", 1.0);
        pool.insert(&ledger, tx.clone()).unwrap();

        assert!(pool.remove(&tx.hash).is_some());
        assert!(pool.remove(&tx.hash).is_none());
        assert!(pool.is_empty());
    }
}
