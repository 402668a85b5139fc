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

use crate::peers::{PeerInfo, PeerStatus};

use std::{collections::HashMap, net::SocketAddr};

/// The list of connected and disconnected peers of this node.
#[derive(Debug, Default)]
pub struct PeerBook {
    peers: HashMap<SocketAddr, PeerInfo>,
}

impl PeerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a peer connected, creating its entry on first contact.
    pub fn set_connected(&mut self, address: SocketAddr, node_id: &str) -> &PeerInfo {
        let peer = self
            .peers
            .entry(address)
            .or_insert_with(|| PeerInfo::new(address));
        peer.set_connected(node_id);
        peer
    }

    /// Marks a peer disconnected, keeping its history.
    pub fn set_disconnected(&mut self, address: SocketAddr) {
        if let Some(peer) = self.peers.get_mut(&address) {
            if peer.status() == PeerStatus::Connected {
                peer.set_disconnected();
            }
        }
    }

    /// Records a peer learned from gossip without connecting to it.
    pub fn add_gossiped(&mut self, address: SocketAddr) {
        self.peers.entry(address).or_insert_with(|| PeerInfo::new(address));
    }

    /// Returns the entry for the given address.
    #[inline]
    pub fn get(&self, address: &SocketAddr) -> Option<&PeerInfo> {
        self.peers.get(address)
    }

    /// Returns `true` when the peer is currently connected.
    #[inline]
    pub fn is_connected(&self, address: &SocketAddr) -> bool {
        self.peers
            .get(address)
            .map_or(false, |peer| peer.status() == PeerStatus::Connected)
    }

    /// Returns the addresses of every connected peer.
    pub fn connected_addresses(&self) -> Vec<SocketAddr> {
        self.peers
            .values()
            .filter(|peer| peer.status() == PeerStatus::Connected)
            .map(|peer| peer.address())
            .collect()
    }

    /// Returns a snapshot of every connected peer.
    pub fn connected_peers(&self) -> Vec<PeerInfo> {
        self.peers
            .values()
            .filter(|peer| peer.status() == PeerStatus::Connected)
            .cloned()
            .collect()
    }

    /// The number of currently connected peers.
    pub fn connected_count(&self) -> usize {
        self.peers
            .values()
            .filter(|peer| peer.status() == PeerStatus::Connected)
            .count()
    }

    /// Returns every known address, connected or not.
    pub fn known_addresses(&self) -> Vec<SocketAddr> {
        self.peers.keys().copied().collect()
    }
}
