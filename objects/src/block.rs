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

use crate::{
    errors::BlockError,
    hash::{sha256_hex, timestamp_now},
    merkle::merkle_root,
    transaction::Transaction,
    EMPTY_MERKLE_ROOT,
    GENESIS_ADDRESS,
    GENESIS_ALLOCATION,
    GENESIS_PREVIOUS_HASH,
};

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};

/// A hash-linked, ordered transaction container, immutable after mining.
///
/// A block carries either a proof-of-work solution (its hash satisfies the
/// difficulty target) or a validator attestation, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Monotonic position in the chain; genesis is 0.
    pub index: u32,
    /// The predecessor's hash, or `"0"` for genesis.
    pub previous_hash: String,
    /// Assembly time in Unix seconds.
    pub timestamp: i64,
    /// Ordered transactions; coinbase at position 0 when applicable.
    pub transactions: Vec<Transaction>,
    /// Merkle root over the transaction digests; `"0"` when empty.
    pub merkle_root: String,
    /// The proof-of-work counter.
    pub nonce: u64,
    /// Digest of the header fields.
    pub hash: String,
    /// The attesting validator on the proof-of-stake path.
    pub validator: Option<String>,
    /// The validator's simulated attestation signature.
    pub signature: Option<String>,
}

impl Block {
    /// Creates an empty, unmined block following `previous_hash`.
    pub fn new(index: u32, previous_hash: impl Into<String>) -> Self {
        let mut block = Self {
            index,
            previous_hash: previous_hash.into(),
            timestamp: timestamp_now(),
            transactions: vec![],
            merkle_root: EMPTY_MERKLE_ROOT.to_owned(),
            nonce: 0,
            hash: String::new(),
            validator: None,
            signature: None,
        };
        block.hash = block.compute_hash();
        block
    }

    /// Creates the genesis block funding the `GENESIS` address.
    pub fn genesis() -> Self {
        let mut block = Self::new(0, GENESIS_PREVIOUS_HASH);
        block
            .transactions
            .push(Transaction::coinbase(GENESIS_ADDRESS, GENESIS_ALLOCATION));
        block.seal();
        block
    }

    /// Appends a transaction after checking its structural validity.
    ///
    /// The Merkle root and hash are NOT recomputed here; sealing or mining
    /// the block is the caller's responsibility.
    pub fn add_transaction(&mut self, transaction: Transaction) -> Result<(), BlockError> {
        if !transaction.is_valid() {
            return Err(BlockError::InvalidTransaction(transaction.hash));
        }
        self.transactions.push(transaction);
        Ok(())
    }

    /// Recomputes the Merkle root over the contained transactions.
    pub fn compute_merkle_root(&self) -> String {
        merkle_root(self.transactions.iter().map(|tx| tx.hash.clone()).collect())
    }

    /// Recomputes the header digest. The validator address is part of the
    /// preimage iff an attestation is attached.
    pub fn compute_hash(&self) -> String {
        let mut preimage = format!(
            "{}{}{}{}{}",
            self.index, self.previous_hash, self.timestamp, self.merkle_root, self.nonce
        );
        if let Some(validator) = &self.validator {
            preimage.push_str(validator);
        }
        sha256_hex(&preimage)
    }

    /// Recomputes the Merkle root and hash after transaction changes.
    pub fn seal(&mut self) {
        self.merkle_root = self.compute_merkle_root();
        self.hash = self.compute_hash();
    }

    /// Returns `true` when the hash starts with `difficulty` zero hex chars.
    pub fn meets_difficulty(&self, difficulty: u32) -> bool {
        let difficulty = difficulty as usize;
        self.hash.len() >= difficulty && self.hash.as_bytes()[..difficulty].iter().all(|&b| b == b'0')
    }

    /// Searches nonces from zero until the difficulty target is satisfied.
    ///
    /// The search is unbounded; callers needing interruption or nonce
    /// partitioning should use the mining engine instead.
    pub fn mine(&mut self, difficulty: u32) {
        let never = AtomicBool::new(false);
        // The search only stops on success with a never-set flag.
        let _ = self.mine_until(difficulty, &never);
    }

    /// Searches nonces from zero until the difficulty target is satisfied or
    /// the stop flag is raised. Returns `true` on success.
    pub fn mine_until(&mut self, difficulty: u32, should_stop: &AtomicBool) -> bool {
        self.merkle_root = self.compute_merkle_root();
        self.nonce = 0;
        loop {
            self.hash = self.compute_hash();
            if self.meets_difficulty(difficulty) {
                return true;
            }
            if should_stop.load(Ordering::Relaxed) {
                return false;
            }
            self.nonce += 1;
        }
    }
}
