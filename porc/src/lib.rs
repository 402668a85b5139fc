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

//! Rewards wallets for relaying bandwidth on behalf of the network.
//!
//! Enrolled wallets rotate through pools; each block window the engine
//! assigns relay tasks to active pool members, verifies the contribution
//! proofs they submit, and mints a bounded share of the daily reward pool
//! to contributors while burning half of the block's transaction fees.

#[macro_use]
extern crate tracing;

pub mod contribution;
pub use contribution::Contribution;

pub mod engine;
pub use engine::{PorcEngine, PorcStats, PorcStatsSnapshot};

pub mod error;
pub use error::PorcError;

pub mod pool;
pub use pool::Pool;

pub mod store;
pub use store::PorcStore;

pub mod task;
pub use task::{Task, TaskKind};

pub mod wallet;
pub use wallet::WalletStatus;

/// The minimum balance a wallet needs to enroll.
pub const MIN_BALANCE: f64 = 5.0;

/// The minimum number of recent transactions a wallet needs to enroll.
pub const MIN_ACTIVITY: usize = 1;

/// The activity lookback window in seconds (30 days).
pub const ACTIVITY_WINDOW_SECS: i64 = 30 * 24 * 60 * 60;

/// Enrollees beyond this count no longer receive the early-adopter bonus.
pub const EARLY_ADOPTER_LIMIT: usize = 1000;

/// The permanent reward multiplier granted to early adopters.
pub const EARLY_ADOPTER_MULTIPLIER: f64 = 1.5;

/// The maximum number of wallets per pool.
pub const POOL_SIZE: usize = 100;

/// Blocks between pool rotations; also the width of a pool's window.
pub const POOL_ROTATION_BLOCKS: u32 = 10;

/// The total reward budget distributed per day, in NIL.
pub const DAILY_REWARD_POOL: f64 = 500.0;

/// The nominal number of blocks per day used to slice the daily budget.
pub const BLOCKS_PER_DAY: u32 = 36_000;

/// The hard cap on what a single wallet may earn per block.
pub const MAX_REWARD_PER_BLOCK: f64 = 0.5;

/// The share of block transaction fees removed from supply.
pub const BURN_RATE: f64 = 0.5;

/// Resource points granted per relayed megabyte.
pub const RESOURCE_POINT_MB: f64 = 1.0;

/// Resource points granted per ten relayed transactions.
pub const RESOURCE_POINT_TX: f64 = 1.0;
