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

pub mod error;
pub use error::StorageError;

pub mod ledger;
pub use ledger::{
    contract_address,
    Ledger,
    DEFAULT_DIFFICULTY,
    DEFAULT_MINING_REWARD,
    DEFAULT_TRANSACTION_FEE,
};

pub mod snapshot;
pub use snapshot::Snapshot;
