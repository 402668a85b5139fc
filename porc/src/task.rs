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

use nilotic_objects::sha256_hex;

use serde::{Deserialize, Serialize};

/// The kind of relay work assigned to a wallet, with a typed payload per
/// variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskKind {
    /// Re-broadcast pending transactions to connected peers.
    RelayTransactions { transaction_hashes: Vec<String> },
    /// Forward a freshly accepted block.
    PropagateBlock { block_hash: String, block_height: u32 },
    /// Keep recent chain data warm for syncing peers.
    CacheData { block_hashes: Vec<String> },
    /// Probe a sample of peers for liveness.
    VerifyPeers { sample_size: u32 },
}

impl TaskKind {
    /// The stable name used in task identifiers.
    pub fn name(&self) -> &'static str {
        match self {
            TaskKind::RelayTransactions { .. } => "relay_transactions",
            TaskKind::PropagateBlock { .. } => "propagate_block",
            TaskKind::CacheData { .. } => "cache_data",
            TaskKind::VerifyPeers { .. } => "verify_peers",
        }
    }

    /// A rough bandwidth estimate used for capacity planning, in MB.
    pub fn estimated_bandwidth_mb(&self) -> f64 {
        match self {
            TaskKind::RelayTransactions { transaction_hashes } => {
                0.25 * transaction_hashes.len().max(1) as f64
            }
            TaskKind::PropagateBlock { .. } => 1.0,
            TaskKind::CacheData { block_hashes } => 0.5 * block_hashes.len().max(1) as f64,
            TaskKind::VerifyPeers { sample_size } => 0.05 * (*sample_size).max(1) as f64,
        }
    }

    /// The number of transactions the task is expected to touch.
    pub fn estimated_tx_count(&self) -> u32 {
        match self {
            TaskKind::RelayTransactions { transaction_hashes } => transaction_hashes.len() as u32,
            _ => 0,
        }
    }
}

/// A unit of relay work assigned to a single pool wallet for one height.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub kind: TaskKind,
    pub assigned_wallet: String,
    pub block_height: u32,
}

impl Task {
    /// Creates a task with its deterministic identifier.
    pub fn new(kind: TaskKind, assigned_wallet: impl Into<String>, block_height: u32) -> Self {
        let assigned_wallet = assigned_wallet.into();
        let task_id = Self::id_for(block_height, &assigned_wallet, kind.name());
        Self {
            task_id,
            kind,
            assigned_wallet,
            block_height,
        }
    }

    /// The deterministic identifier for a `(height, wallet, kind)` triple.
    pub fn id_for(block_height: u32, wallet: &str, kind_name: &str) -> String {
        let digest = sha256_hex(&format!("{}:{}:{}", block_height, wallet, kind_name));
        format!("task-{}", &digest[..16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_ids_are_deterministic_and_distinct() {
        let relay = TaskKind::RelayTransactions { transaction_hashes: vec![] };
        let probe = TaskKind::VerifyPeers { sample_size: 4 };

        let a = Task::new(relay.clone(), "alice", 7);
        let b = Task::new(relay, "alice", 7);
        assert_eq!(a.task_id, b.task_id);

        let c = Task::new(probe.clone(), "alice", 7);
        assert_ne!(a.task_id, c.task_id);

        let d = Task::new(probe.clone(), "bob", 7);
        let e = Task::new(probe, "alice", 8);
        assert_ne!(c.task_id, d.task_id);
        assert_ne!(c.task_id, e.task_id);
    }

    #[test]
    fn estimates_scale_with_the_payload() {
        let relay = TaskKind::RelayTransactions {
            transaction_hashes: vec!["a".into(), "b".into(), "c".into(), "d".into()],
        };
        assert_eq!(relay.estimated_bandwidth_mb(), 1.0);
        assert_eq!(relay.estimated_tx_count(), 4);
        assert_eq!(TaskKind::PropagateBlock { block_hash: "h".into(), block_height: 1 }.estimated_tx_count(), 0);
    }
}
