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

use nilotic_consensus::{ConsensusParameters, MemoryPool, Miner};
use nilotic_objects::Transaction;
use nilotic_storage::Ledger;

use once_cell::sync::Lazy;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;

/// The difficulty used by test chains; one leading zero keeps nonce
/// searches nearly instant.
pub const TEST_DIFFICULTY: u32 = 1;

/// Consensus parameters tuned for fast tests: two workers and a narrow
/// retarget window.
pub static TEST_PARAMETERS: Lazy<Arc<ConsensusParameters>> = Lazy::new(|| {
    Arc::new(ConsensusParameters {
        difficulty_adjustment_blocks: 4,
        mining_threads: 2,
        ..Default::default()
    })
});

/// A fresh shared ledger holding only genesis, retargeted for fast mining.
pub fn test_ledger() -> Arc<RwLock<Ledger>> {
    let mut ledger = Ledger::new();
    ledger.difficulty = TEST_DIFFICULTY;
    Arc::new(RwLock::new(ledger))
}

/// An empty shared memory pool.
pub fn test_pool() -> Arc<Mutex<MemoryPool>> {
    Arc::new(Mutex::new(MemoryPool::new()))
}

/// A miner bound to the shared test parameters.
pub fn test_miner(address: &str) -> Miner {
    Miner::new(address, Arc::clone(&TEST_PARAMETERS))
}

/// A transfer signed with the sender's simulated key.
pub fn signed_transaction(sender: &str, recipient: &str, amount: f64) -> Transaction {
    let mut tx = Transaction::new(sender, recipient, amount);
    tx.sign(&format!("{}-key", sender));
    tx
}

/// Mines `blocks` empty blocks onto the shared ledger.
pub fn grow_chain(
    miner: &Miner,
    ledger: &Arc<RwLock<Ledger>>,
    pool: &Arc<Mutex<MemoryPool>>,
    blocks: u32,
) {
    for _ in 0..blocks {
        miner
            .mine_block(ledger, pool, 0)
            .expect("test mining should always succeed");
    }
}
