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
    difficulty::next_difficulty,
    error::{BlockRejection, ConsensusError},
    MemoryPool,
    DIFFICULTY_ADJUSTMENT_BLOCKS,
    HALVING_PERIOD,
    MAX_TRANSACTIONS_PER_BLOCK,
    TARGET_BLOCK_TIME_SECS,
};
use nilotic_objects::Block;
use nilotic_storage::Ledger;

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The consensus parameters for the network of this node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusParameters {
    /// The desired seconds between consecutive blocks.
    pub target_block_time: i64,
    /// Blocks between difficulty retargets.
    pub difficulty_adjustment_blocks: u32,
    /// The lowest difficulty the retarget may reach; never zero.
    pub min_difficulty: u32,
    /// The highest difficulty the retarget may reach.
    pub max_difficulty: u32,
    /// The number of pending transactions included per block.
    pub max_transactions_per_block: usize,
    /// Blocks between reward halvings.
    pub halving_period: u32,
    /// The number of worker threads partitioning the nonce space.
    pub mining_threads: usize,
}

impl Default for ConsensusParameters {
    fn default() -> Self {
        Self {
            target_block_time: TARGET_BLOCK_TIME_SECS,
            difficulty_adjustment_blocks: DIFFICULTY_ADJUSTMENT_BLOCKS,
            min_difficulty: 1,
            max_difficulty: 8,
            max_transactions_per_block: MAX_TRANSACTIONS_PER_BLOCK,
            halving_period: HALVING_PERIOD,
            mining_threads: num_cpus::get().max(1),
        }
    }
}

impl ConsensusParameters {
    /// Returns the coinbase reward at the given height: the base reward
    /// halved once per elapsed halving period.
    pub fn block_reward(&self, base_reward: f64, height: u32) -> f64 {
        let halvings = height / self.halving_period;
        if halvings >= 64 {
            return 0.0;
        }
        base_reward / (1u64 << halvings) as f64
    }

    /// The difficulty an incoming proof-of-work block must satisfy.
    #[inline]
    pub fn effective_difficulty(&self, ledger: &Ledger) -> u32 {
        ledger.difficulty.max(self.min_difficulty)
    }

    /// Validates an incoming block against the current chain head.
    ///
    /// Checks run in a fixed order: hash linkage, index continuity, the
    /// proof (a work target or a stake attestation, never both), the
    /// contained transactions under running balances, the Merkle root, and
    /// finally the header digest itself.
    pub fn verify_block(&self, ledger: &Ledger, block: &Block) -> Result<(), ConsensusError> {
        let head = ledger.latest_block();
        if block.previous_hash != head.hash {
            return Err(ConsensusError::BlockRejected(BlockRejection::BadPrevHash));
        }
        if block.index != head.index + 1 {
            return Err(ConsensusError::BlockRejected(BlockRejection::NonSequentialIndex));
        }

        match &block.validator {
            Some(validator) => {
                if ledger.stake_of(validator) <= 0.0 {
                    return Err(ConsensusError::NotAValidator(validator.clone()));
                }
                if block.signature.as_deref().map_or(true, str::is_empty) {
                    return Err(ConsensusError::NotAValidator(validator.clone()));
                }
            }
            None => {
                if !block.meets_difficulty(self.effective_difficulty(ledger)) {
                    return Err(ConsensusError::BlockRejected(BlockRejection::PowFailed));
                }
            }
        }

        // Transactions are checked under running balances in block order.
        let mut deltas: HashMap<&str, f64> = HashMap::new();
        for tx in &block.transactions {
            if !tx.is_valid() || ledger.contains_transaction(&tx.hash) {
                return Err(ConsensusError::BlockRejected(BlockRejection::InvalidTxInBlock));
            }
            if tx.is_coinbase() {
                *deltas.entry(tx.recipient.as_str()).or_insert(0.0) += tx.amount;
            } else if !tx.is_contract_deployment() {
                let available = ledger.balance_of(&tx.sender) + deltas.get(tx.sender.as_str()).copied().unwrap_or(0.0);
                if available < tx.amount {
                    return Err(ConsensusError::BlockRejected(BlockRejection::InvalidTxInBlock));
                }
                *deltas.entry(tx.sender.as_str()).or_insert(0.0) -= tx.amount;
                *deltas.entry(tx.recipient.as_str()).or_insert(0.0) += tx.amount;
            }
        }

        if block.merkle_root != block.compute_merkle_root() {
            return Err(ConsensusError::BlockRejected(BlockRejection::MerkleMismatch));
        }
        if block.hash != block.compute_hash() {
            return Err(ConsensusError::BlockRejected(BlockRejection::HashMismatch));
        }

        Ok(())
    }

    /// Verifies and appends a block, prunes its transactions from the
    /// memory pool, and retargets difficulty on window boundaries.
    ///
    /// The whole step runs under the ledger write lock, so concurrent
    /// miners cannot append competing blocks: the loser fails the linkage
    /// check. Returns the new chain height.
    pub fn receive_block(
        &self,
        ledger: &RwLock<Ledger>,
        memory_pool: &Mutex<MemoryPool>,
        block: &Block,
    ) -> Result<u32, ConsensusError> {
        let mut ledger = ledger.write();
        self.verify_block(&ledger, block)?;
        ledger.apply_block(block)?;

        let mut memory_pool = memory_pool.lock();
        for tx in &block.transactions {
            memory_pool.remove(&tx.hash);
        }
        drop(memory_pool);

        let height = ledger.height();
        if height % self.difficulty_adjustment_blocks == 0 {
            let retargeted = next_difficulty(self, &ledger);
            if retargeted != ledger.difficulty {
                info!(
                    "difficulty retargeted from {} to {} at height {}",
                    ledger.difficulty, retargeted, height
                );
                ledger.difficulty = retargeted;
            }
        }

        info!("accepted block {} ({})", block.index, block.hash);
        Ok(height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reward_halves_on_period_boundaries() {
        let parameters = ConsensusParameters::default();
        assert_eq!(parameters.block_reward(100.0, 0), 100.0);
        assert_eq!(parameters.block_reward(100.0, 209_999), 100.0);
        assert_eq!(parameters.block_reward(100.0, 210_000), 50.0);
        assert_eq!(parameters.block_reward(100.0, 420_000), 25.0);
    }

    #[test]
    fn reward_reaches_zero_after_many_halvings() {
        let parameters = ConsensusParameters::default();
        assert_eq!(parameters.block_reward(100.0, u32::MAX), 0.0);
    }

    #[test]
    fn difficulty_zero_is_never_effective() {
        let parameters = ConsensusParameters::default();
        let mut ledger = Ledger::new();
        ledger.difficulty = 0;
        assert_eq!(parameters.effective_difficulty(&ledger), parameters.min_difficulty);
    }
}
