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

use crate::{Ledger, StorageError};
use nilotic_objects::{Block, Transaction};

use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, HashSet},
    fs,
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

/// A durable capture of the chain, derived tables, and pending queue.
///
/// The snapshot is the logical persistence contract of the node: saving at a
/// quiet point and restoring on startup reproduces the ledger exactly,
/// including the burn and mint counters.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub blocks: Vec<Block>,
    pub balances: HashMap<String, f64>,
    pub stakes: HashMap<String, f64>,
    pub contracts: HashMap<String, String>,
    pub applied: HashSet<String>,
    pub pending: Vec<Transaction>,
    pub burned: f64,
    pub minted: f64,
    pub offline_transfers: u64,
    pub difficulty: u32,
    pub mining_reward: f64,
    pub transaction_fee: f64,
}

impl Snapshot {
    /// Captures the ledger plus the pending queue handed over by the owner.
    pub fn capture(ledger: &Ledger, pending: Vec<Transaction>) -> Self {
        Self {
            blocks: ledger.chain().to_vec(),
            balances: ledger.balances().clone(),
            stakes: ledger.stakes().clone(),
            contracts: ledger.contracts().clone(),
            applied: ledger.applied_hashes().clone(),
            pending,
            burned: ledger.burned(),
            minted: ledger.minted(),
            offline_transfers: ledger.offline_transfers(),
            difficulty: ledger.difficulty,
            mining_reward: ledger.mining_reward,
            transaction_fee: ledger.transaction_fee,
        }
    }

    /// Writes the snapshot as JSON, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        info!("saved a snapshot of {} blocks to {}", self.blocks.len(), path.display());
        Ok(())
    }

    /// Reads a snapshot back. A malformed file is a hard error; the caller
    /// decides whether to refuse startup.
    pub fn load(path: &Path) -> Result<Self, StorageError> {
        let file = File::open(path)?;
        let snapshot: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|error| StorageError::CorruptSnapshot(path.display().to_string(), error.to_string()))?;
        if snapshot.blocks.is_empty() {
            return Err(StorageError::EmptySnapshot);
        }
        Ok(snapshot)
    }

    /// Rebuilds the ledger and the pending queue from this snapshot.
    pub fn restore(self) -> (Ledger, Vec<Transaction>) {
        let ledger = Ledger::from_parts(
            self.blocks,
            self.balances,
            self.stakes,
            self.contracts,
            self.applied,
            self.burned,
            self.minted,
            self.offline_transfers,
            self.difficulty,
            self.mining_reward,
            self.transaction_fee,
        );
        (ledger, self.pending)
    }
}
