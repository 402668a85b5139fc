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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering},
        Arc,
    },
};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub enum PeerStatus {
    Connecting,
    Connected,
    Disconnected,
    NeverConnected,
}

/// Live connection quality, shared with the keep-alive task.
#[derive(Debug, Default)]
pub struct PeerQuality {
    /// Whether a `Pong` is currently expected from this peer.
    pub expecting_pong: AtomicBool,
    /// The nonce of the outstanding ping.
    pub last_ping_nonce: AtomicU64,
    /// Consecutive ping cycles the peer failed to answer.
    pub missed_pongs: AtomicU8,
    /// The number of failures associated with the peer; grounds for dismissal.
    pub failures: AtomicU8,
    /// The highest sequence number received from this peer.
    pub last_sequence: AtomicU64,
}

/// A data structure containing information about a peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerInfo {
    /// The socket address of this peer.
    address: SocketAddr,
    /// The peer's self-declared node identifier from the handshake.
    node_id: String,
    /// The current status of this peer.
    status: PeerStatus,
    /// The timestamp of the first seen instance of this peer.
    first_seen: Option<DateTime<Utc>>,
    /// The timestamp of the last connection to this peer.
    last_connected: Option<DateTime<Utc>>,
    /// The timestamp of the last disconnect from this peer.
    last_disconnected: Option<DateTime<Utc>>,
    /// The number of times we have connected to this peer.
    connected_count: u64,
    /// The number of times we have disconnected from this peer.
    disconnected_count: u64,
    /// The quality of the connection with the peer.
    #[serde(skip)]
    pub quality: Arc<PeerQuality>,
}

impl PeerInfo {
    /// Creates a new instance of `PeerInfo`.
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            node_id: String::new(),
            status: PeerStatus::NeverConnected,
            first_seen: None,
            last_connected: None,
            last_disconnected: None,
            connected_count: 0,
            disconnected_count: 0,
            quality: Default::default(),
        }
    }

    /// Returns the socket address of this peer.
    #[inline]
    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Returns the node identifier learned during the handshake.
    #[inline]
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Returns the current status of this peer.
    #[inline]
    pub fn status(&self) -> PeerStatus {
        self.status
    }

    /// Returns the timestamp of the first seen instance of this peer.
    #[inline]
    pub fn first_seen(&self) -> Option<DateTime<Utc>> {
        self.first_seen
    }

    /// Returns the timestamp of the last connection to this peer.
    #[inline]
    pub fn last_connected(&self) -> Option<DateTime<Utc>> {
        self.last_connected
    }

    /// Returns the timestamp of the last disconnect from this peer.
    #[inline]
    pub fn last_disconnected(&self) -> Option<DateTime<Utc>> {
        self.last_disconnected
    }

    /// Marks the peer connected under the given node id.
    pub fn set_connected(&mut self, node_id: impl Into<String>) {
        let now = Utc::now();
        self.node_id = node_id.into();
        self.status = PeerStatus::Connected;
        self.first_seen.get_or_insert(now);
        self.last_connected = Some(now);
        self.connected_count += 1;
        self.quality.expecting_pong.store(false, Ordering::SeqCst);
        self.quality.missed_pongs.store(0, Ordering::SeqCst);
        self.quality.last_sequence.store(0, Ordering::SeqCst);
    }

    /// Marks the peer disconnected.
    pub fn set_disconnected(&mut self) {
        self.status = PeerStatus::Disconnected;
        self.last_disconnected = Some(Utc::now());
        self.disconnected_count += 1;
    }

    /// Accepts a sequence number iff it advances the per-peer counter.
    /// Non-monotonic messages must be dropped by the caller.
    pub fn advance_sequence(&self, sequence: u64) -> bool {
        let last = self.quality.last_sequence.load(Ordering::SeqCst);
        if sequence <= last && last != 0 {
            return false;
        }
        self.quality.last_sequence.store(sequence, Ordering::SeqCst);
        true
    }
}
