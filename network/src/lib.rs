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

pub mod codec;
pub use codec::{deserialize_message, read_message, serialize_message, write_message};

pub mod error;
pub use error::NetworkError;

pub mod message;
pub use message::{Message, MessageType, Payload};

pub mod outbound;
pub use outbound::Outbound;

pub mod peers;
pub use peers::{PeerBook, PeerInfo, PeerQuality, PeerStatus};

pub mod server;
pub use server::{Server, ServerConfig};

/// The magic prefix every handshake must carry.
pub const PROTOCOL_MAGIC: &str = "NILOTIC";

/// The wire protocol version spoken by this node.
pub const PROTOCOL_VERSION: u8 = 1;

/// The hard cap on a single framed message.
pub const MAX_MESSAGE_SIZE: usize = 8 * 1024 * 1024;

/// The default listening port.
pub const DEFAULT_PORT: u16 = 5500;

/// Seconds a pending handshake may take before the connection is closed.
pub const HANDSHAKE_TIMEOUT_SECS: u64 = 5;

/// Seconds between keep-alive pings; two missed cycles disconnect a peer.
pub const PING_INTERVAL_SECS: u64 = 10;

/// The most blocks returned for a single sync request.
pub const MAX_BLOCKS_PER_RESPONSE: usize = 256;

/// The capacity of the central inbound processing queue.
pub const INBOUND_CHANNEL_CAPACITY: usize = 1024;
