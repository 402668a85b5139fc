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

use serde::{Deserialize, Serialize};

/// The contribution status of an enrolled wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletStatus {
    pub address: String,
    /// Whether the wallet currently participates in task assignment.
    pub enabled: bool,
    /// Lifetime resource points earned from verified contributions.
    pub total_resource_points: f64,
    /// Lifetime NIL minted to this wallet by the engine.
    pub total_rewards: f64,
    /// The timestamp of the last accepted contribution.
    pub last_contribution_ts: i64,
    /// A coarse quality score; grows with each accepted contribution.
    pub reputation_score: f64,
    /// The self-declared relay capacity verified against daily usage.
    pub bandwidth_limit_mb_per_day: f64,
    /// Whether this wallet enrolled within the early-adopter limit.
    pub is_early_adopter: bool,
    /// The pool the wallet currently belongs to, if any.
    pub pool_index: Option<usize>,
}

impl WalletStatus {
    pub fn new(address: impl Into<String>, bandwidth_limit_mb_per_day: f64, is_early_adopter: bool) -> Self {
        Self {
            address: address.into(),
            enabled: true,
            total_resource_points: 0.0,
            total_rewards: 0.0,
            last_contribution_ts: 0,
            reputation_score: 0.0,
            bandwidth_limit_mb_per_day,
            is_early_adopter,
            pool_index: None,
        }
    }
}
