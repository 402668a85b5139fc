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

use nilotic_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PorcError {
    #[error("{address} is not eligible: {reason}")]
    Ineligible { address: String, reason: String },

    #[error("{0} is not enrolled")]
    WalletNotEnrolled(String),

    #[error("task {0} does not exist")]
    UnknownTask(String),

    #[error("task {task_id} is not assigned to {wallet}")]
    TaskNotAssigned { task_id: String, wallet: String },

    #[error("contribution proof rejected: {0}")]
    ProofInvalid(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}
