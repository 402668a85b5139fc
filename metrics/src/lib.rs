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

use serde::Serialize;
use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// Process-wide node counters. Every field is atomic, so any thread may
/// bump them without coordination; the node samples and logs them on a
/// fixed interval.
#[derive(Debug, Default)]
pub struct Metrics {
    pub blocks_accepted: AtomicU64,
    pub blocks_rejected: AtomicU64,
    pub transactions_accepted: AtomicU64,
    pub transactions_rejected: AtomicU64,
    pub messages_received: AtomicU64,
    pub messages_sent: AtomicU64,
    pub peers_connected: AtomicU64,
    pub contributions_verified: AtomicU64,
}

/// A point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub blocks_accepted: u64,
    pub blocks_rejected: u64,
    pub transactions_accepted: u64,
    pub transactions_rejected: u64,
    pub messages_received: u64,
    pub messages_sent: u64,
    pub peers_connected: u64,
    pub contributions_verified: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies the counters at this instant.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            blocks_accepted: self.blocks_accepted.load(Ordering::Relaxed),
            blocks_rejected: self.blocks_rejected.load(Ordering::Relaxed),
            transactions_accepted: self.transactions_accepted.load(Ordering::Relaxed),
            transactions_rejected: self.transactions_rejected.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            messages_sent: self.messages_sent.load(Ordering::Relaxed),
            peers_connected: self.peers_connected.load(Ordering::Relaxed),
            contributions_verified: self.contributions_verified.load(Ordering::Relaxed),
        }
    }

    /// Logs a one-line summary of the current counters.
    pub fn report(&self) {
        info!("{}", self.snapshot());
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "blocks {}/{} txs {}/{} msgs in {} out {} peers {}",
            self.blocks_accepted,
            self.blocks_rejected,
            self.transactions_accepted,
            self.transactions_rejected,
            self.messages_received,
            self.messages_sent,
            self.peers_connected
        )
    }
}
