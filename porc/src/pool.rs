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

use crate::{POOL_ROTATION_BLOCKS, POOL_SIZE};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A rotating group of wallets jointly eligible for relay work while the
/// chain height lies inside the pool's `[block_start, block_end)` window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pool {
    pub index: usize,
    pub members: BTreeSet<String>,
    /// Resource points accumulated by members since the last distribution.
    pub points: HashMap<String, f64>,
    pub block_start: u32,
    pub block_end: u32,
}

impl Pool {
    pub fn new(index: usize, block_start: u32) -> Self {
        Self {
            index,
            members: BTreeSet::new(),
            points: HashMap::new(),
            block_start,
            block_end: block_start + POOL_ROTATION_BLOCKS,
        }
    }

    /// Returns whether the pool is active at the given chain height.
    #[inline]
    pub fn is_active(&self, height: u32) -> bool {
        self.block_start <= height && height < self.block_end
    }

    /// Returns whether another member fits under the pool size cap.
    #[inline]
    pub fn has_capacity(&self) -> bool {
        self.members.len() < POOL_SIZE
    }

    /// Folds verified resource points into the member's running total.
    pub fn add_points(&mut self, wallet: &str, points: f64) {
        *self.points.entry(wallet.to_owned()).or_insert(0.0) += points;
    }

    /// The sum of all accumulated points in this pool.
    pub fn total_points(&self) -> f64 {
        self.points.values().sum()
    }

    /// Clears accumulated points after a reward distribution.
    pub fn reset_points(&mut self) {
        self.points.clear();
    }
}

/// Partitions the given wallets into pools of at most `POOL_SIZE` members
/// with windows starting at `block_start`. Wallets are taken in sorted
/// order so repartitioning is deterministic.
pub fn partition(wallets: &BTreeSet<String>, block_start: u32) -> Vec<Pool> {
    let mut pools = vec![];
    for (index, chunk) in wallets
        .iter()
        .collect::<Vec<_>>()
        .chunks(POOL_SIZE)
        .enumerate()
    {
        let mut pool = Pool::new(index, block_start);
        for wallet in chunk {
            pool.members.insert((*wallet).clone());
        }
        pools.push(pool);
    }
    pools
}
