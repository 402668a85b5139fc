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

use crate::{RESOURCE_POINT_MB, RESOURCE_POINT_TX};
use nilotic_objects::{amount_text, sha256_hex, timestamp_now};

use serde::{Deserialize, Serialize};

/// A proof of relay work submitted by a pool wallet.
///
/// The `proof_hash` commits to the canonical fields; the `signature` is a
/// simulated digest with no cryptographic strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub wallet_address: String,
    pub task_id: String,
    pub timestamp: i64,
    pub block_height: u32,
    pub bandwidth_used_mb: f64,
    pub transactions_relayed: u32,
    pub uptime_seconds: u64,
    pub proof_hash: String,
    pub signature: String,
}

impl Contribution {
    /// Creates a contribution with the proof hash filled in and the
    /// signature left empty.
    pub fn new(
        wallet_address: impl Into<String>,
        task_id: impl Into<String>,
        block_height: u32,
        bandwidth_used_mb: f64,
        transactions_relayed: u32,
        uptime_seconds: u64,
    ) -> Self {
        let mut contribution = Self {
            wallet_address: wallet_address.into(),
            task_id: task_id.into(),
            timestamp: timestamp_now(),
            block_height,
            bandwidth_used_mb,
            transactions_relayed,
            uptime_seconds,
            proof_hash: String::new(),
            signature: String::new(),
        };
        contribution.proof_hash = contribution.expected_proof();
        contribution
    }

    /// The digest the proof hash must match: a concatenation of the wallet,
    /// task, timestamp, height, bandwidth, relayed count, and uptime.
    pub fn expected_proof(&self) -> String {
        sha256_hex(&format!(
            "{}{}{}{}{}{}{}",
            self.wallet_address,
            self.task_id,
            self.timestamp,
            self.block_height,
            amount_text(self.bandwidth_used_mb),
            self.transactions_relayed,
            self.uptime_seconds
        ))
    }

    /// Attaches a simulated signature derived from the proof and the key.
    pub fn sign(&mut self, key: &str) {
        self.signature = sha256_hex(&format!("{}{}", self.proof_hash, key));
    }

    /// Resource points granted for this contribution: one point per
    /// megabyte plus one point per ten relayed transactions.
    pub fn resource_points(&self) -> f64 {
        self.bandwidth_used_mb * RESOURCE_POINT_MB
            + (self.transactions_relayed / 10) as f64 * RESOURCE_POINT_TX
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_hash_commits_to_every_canonical_field() {
        let base = Contribution::new("alice", "task-1", 5, 10.0, 20, 3600);
        assert_eq!(base.proof_hash, base.expected_proof());

        let mut tampered = base.clone();
        tampered.bandwidth_used_mb = 11.0;
        assert_ne!(tampered.expected_proof(), base.proof_hash);

        let mut tampered = base;
        tampered.uptime_seconds += 1;
        assert_ne!(tampered.expected_proof(), tampered.proof_hash);
    }

    #[test]
    fn resource_points_combine_bandwidth_and_relays() {
        let contribution = Contribution::new("alice", "task-1", 5, 10.0, 20, 0);
        assert_eq!(contribution.resource_points(), 12.0);

        // Relays only count in blocks of ten.
        let sparse = Contribution::new("alice", "task-1", 5, 0.0, 9, 0);
        assert_eq!(sparse.resource_points(), 0.0);
    }

    #[test]
    fn signing_fills_the_signature() {
        let mut contribution = Contribution::new("alice", "task-1", 5, 1.0, 0, 0);
        assert!(contribution.signature.is_empty());
        contribution.sign("alice-key");
        assert_eq!(contribution.signature.len(), 64);
    }
}
