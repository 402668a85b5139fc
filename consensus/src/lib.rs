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

#[macro_use]
extern crate tracing;

pub mod difficulty;

pub mod error;
pub use error::{BlockRejection, ConsensusError};

pub mod memory_pool;
pub use memory_pool::MemoryPool;

pub mod miner;
pub use miner::Miner;

pub mod parameters;
pub use parameters::ConsensusParameters;

pub mod pos;

pub mod rate_limiter;
pub use rate_limiter::RateLimiter;

use nilotic_objects::Block;
use std::sync::Arc;

/// The number of pending transactions a block may carry beyond the coinbase.
pub const MAX_TRANSACTIONS_PER_BLOCK: usize = 10;

/// Blocks between reward halvings.
pub const HALVING_PERIOD: u32 = 210_000;

/// The desired seconds between consecutive blocks.
pub const TARGET_BLOCK_TIME_SECS: i64 = 600;

/// Blocks between difficulty retargets.
pub const DIFFICULTY_ADJUSTMENT_BLOCKS: u32 = 2016;

/// Per-sender transaction submissions permitted per sliding window.
pub const MAX_REQUESTS_PER_MINUTE: usize = 100;

/// The rate-limit window in seconds.
pub const RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// The divisor converting a validator stake into its attestation bonus.
pub const STAKE_REWARD_DIVISOR: f64 = 1000.0;

/// Callback invoked after a block is accepted onto the chain. Registered by
/// the node orchestrator to fan block events out to the contribution engine
/// and the broadcast layer without coupling them to this crate.
pub type BlockHook = Arc<dyn Fn(&Block) + Send + Sync>;
