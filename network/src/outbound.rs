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

use crate::{Message, NetworkError};

use parking_lot::RwLock;
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};
use tokio::sync::mpsc;

/// The map of remote addresses to their per-peer writer queues.
type Channels = HashMap<SocketAddr, mpsc::Sender<Message>>;

/// A core data structure for handling outbound network traffic.
///
/// Each connected peer owns a writer task draining its queue; closing a
/// connection drops the queue along with any messages still in it.
#[derive(Debug, Clone, Default)]
pub struct Outbound {
    channels: Arc<RwLock<Channels>>,
    /// The monotonic counter for the number of sends that succeeded.
    send_success_count: Arc<AtomicU64>,
    /// The monotonic counter for the number of sends that failed.
    send_failure_count: Arc<AtomicU64>,
}

impl Outbound {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the writer queue of a freshly connected peer.
    pub fn register(&self, address: SocketAddr, sender: mpsc::Sender<Message>) {
        self.channels.write().insert(address, sender);
    }

    /// Drops the writer queue of a departed peer and its queued traffic.
    pub fn deregister(&self, address: &SocketAddr) {
        self.channels.write().remove(address);
    }

    /// Queues a message to the given peer.
    pub async fn send(&self, address: SocketAddr, message: Message) -> Result<(), NetworkError> {
        let channel = self
            .channels
            .read()
            .get(&address)
            .cloned()
            .ok_or(NetworkError::PeerNotConnected(address))?;

        match channel.send(message).await {
            Ok(()) => {
                self.send_success_count.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(_) => {
                self.send_failure_count.fetch_add(1, Ordering::Relaxed);
                Err(NetworkError::ChannelClosed(address))
            }
        }
    }

    /// Queues a message to every registered peer except `skip`.
    pub async fn broadcast(&self, message: &Message, skip: Option<SocketAddr>) {
        let channels: Vec<(SocketAddr, mpsc::Sender<Message>)> = self
            .channels
            .read()
            .iter()
            .map(|(address, sender)| (*address, sender.clone()))
            .collect();

        for (address, channel) in channels {
            if Some(address) == skip {
                continue;
            }
            if channel.send(message.clone()).await.is_err() {
                self.send_failure_count.fetch_add(1, Ordering::Relaxed);
                warn!("failed to queue a {} to {}", message, address);
            } else {
                self.send_success_count.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// The number of registered peer queues.
    pub fn len(&self) -> usize {
        self.channels.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.read().is_empty()
    }

    /// Successful and failed send counts since startup.
    pub fn counts(&self) -> (u64, u64) {
        (
            self.send_success_count.load(Ordering::Relaxed),
            self.send_failure_count.load(Ordering::Relaxed),
        )
    }
}
