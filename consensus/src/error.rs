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

use nilotic_objects::BlockError;
use nilotic_storage::StorageError;

use std::fmt;
use thiserror::Error;

/// The reason an incoming block failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockRejection {
    BadPrevHash,
    NonSequentialIndex,
    PowFailed,
    InvalidTxInBlock,
    MerkleMismatch,
    HashMismatch,
}

impl fmt::Display for BlockRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            BlockRejection::BadPrevHash => "bad_prev_hash",
            BlockRejection::NonSequentialIndex => "non_sequential_index",
            BlockRejection::PowFailed => "pow_failed",
            BlockRejection::InvalidTxInBlock => "invalid_tx_in_block",
            BlockRejection::MerkleMismatch => "merkle_mismatch",
            BlockRejection::HashMismatch => "hash_mismatch",
        };
        f.write_str(reason)
    }
}

#[derive(Debug, Error)]
pub enum ConsensusError {
    #[error("invalid transaction {0}")]
    InvalidTransaction(String),

    #[error("duplicate transaction {0}")]
    DuplicateTransaction(String),

    #[error("{address} has {available} but the transfer needs {required}")]
    InsufficientFunds {
        address: String,
        available: f64,
        required: f64,
    },

    #[error("block rejected: {0}")]
    BlockRejected(BlockRejection),

    #[error("{0} holds no stake and cannot attest blocks")]
    NotAValidator(String),

    #[error("sender {0} exceeded the submission rate limit")]
    RateLimited(String),

    #[error("no valid nonce found within {0} attempts")]
    NonceSearchFailed(u64),

    #[error("the nonce search was interrupted by shutdown")]
    Interrupted,

    #[error(transparent)]
    BlockError(#[from] BlockError),

    #[error(transparent)]
    StorageError(#[from] StorageError),
}
