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

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{address} has {available} but the transfer needs {required}")]
    InsufficientFunds {
        address: String,
        available: f64,
        required: f64,
    },

    #[error("{address} has {available} staked but the unstake needs {required}")]
    InsufficientStake {
        address: String,
        available: f64,
        required: f64,
    },

    #[error("transaction {0} was already applied")]
    DuplicateTransaction(String),

    #[error("block {got} does not extend the chain at height {expected}")]
    NonSequentialBlock { expected: u32, got: u32 },

    #[error("block {0} does not link to the current head")]
    BrokenLink(u32),

    #[error("the snapshot at {0} is corrupt: {1}")]
    CorruptSnapshot(String, String),

    #[error("the snapshot chain is empty")]
    EmptySnapshot,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
