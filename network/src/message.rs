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

use nilotic_objects::{sha256_hex, timestamp_now, Block, Transaction};

use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr};

/// The discriminant of a peer message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageType {
    Handshake,
    Ping,
    Pong,
    GetBlocks,
    Blocks,
    GetTransactions,
    Transactions,
    NewBlock,
    NewTransaction,
    PeerList,
    AddPeer,
    RemovePeer,
    MiningRequest,
    MiningResponse,
    ConsensusRequest,
    ConsensusResponse,
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageType::Handshake => "handshake",
            MessageType::Ping => "ping",
            MessageType::Pong => "pong",
            MessageType::GetBlocks => "get_blocks",
            MessageType::Blocks => "blocks",
            MessageType::GetTransactions => "get_transactions",
            MessageType::Transactions => "transactions",
            MessageType::NewBlock => "new_block",
            MessageType::NewTransaction => "new_transaction",
            MessageType::PeerList => "peer_list",
            MessageType::AddPeer => "add_peer",
            MessageType::RemovePeer => "remove_peer",
            MessageType::MiningRequest => "mining_request",
            MessageType::MiningResponse => "mining_response",
            MessageType::ConsensusRequest => "consensus_request",
            MessageType::ConsensusResponse => "consensus_response",
        };
        f.write_str(name)
    }
}

/// The typed payload of a peer message, one variant per message type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    Handshake {
        magic: String,
        version: u8,
        node_id: String,
        nonce: u64,
        height: u32,
    },
    Ping {
        nonce: u64,
        height: u32,
    },
    Pong {
        nonce: u64,
    },
    GetBlocks {
        from: u32,
        to: u32,
    },
    Blocks(Vec<Block>),
    GetTransactions,
    Transactions(Vec<Transaction>),
    NewBlock(Block),
    NewTransaction(Transaction),
    PeerList(Vec<SocketAddr>),
    AddPeer(SocketAddr),
    RemovePeer(SocketAddr),
    MiningRequest {
        miner_address: String,
        max_attempts: u64,
    },
    MiningResponse {
        accepted: bool,
        height: u32,
        block_hash: String,
    },
    ConsensusRequest {
        height: u32,
    },
    ConsensusResponse {
        height: u32,
        head_hash: String,
    },
}

impl Payload {
    /// The message type this payload belongs to.
    pub fn kind(&self) -> MessageType {
        match self {
            Payload::Handshake { .. } => MessageType::Handshake,
            Payload::Ping { .. } => MessageType::Ping,
            Payload::Pong { .. } => MessageType::Pong,
            Payload::GetBlocks { .. } => MessageType::GetBlocks,
            Payload::Blocks(..) => MessageType::Blocks,
            Payload::GetTransactions => MessageType::GetTransactions,
            Payload::Transactions(..) => MessageType::Transactions,
            Payload::NewBlock(..) => MessageType::NewBlock,
            Payload::NewTransaction(..) => MessageType::NewTransaction,
            Payload::PeerList(..) => MessageType::PeerList,
            Payload::AddPeer(..) => MessageType::AddPeer,
            Payload::RemovePeer(..) => MessageType::RemovePeer,
            Payload::MiningRequest { .. } => MessageType::MiningRequest,
            Payload::MiningResponse { .. } => MessageType::MiningResponse,
            Payload::ConsensusRequest { .. } => MessageType::ConsensusRequest,
            Payload::ConsensusResponse { .. } => MessageType::ConsensusResponse,
        }
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

/// The envelope carried by every peer message.
///
/// `sequence` increases monotonically per sender; receivers drop anything
/// that does not advance it, so messages are never applied out of order.
/// An empty `recipient` addresses every connected peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub recipient: String,
    pub timestamp: i64,
    pub sequence: u64,
    pub payload: Payload,
    pub signature: String,
}

impl Message {
    /// Creates an unsigned message stamped with the current time.
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        sequence: u64,
        payload: Payload,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            timestamp: timestamp_now(),
            sequence,
            payload,
            signature: String::new(),
        }
    }

    /// The message type of the carried payload.
    #[inline]
    pub fn kind(&self) -> MessageType {
        self.payload.kind()
    }

    /// Returns `true` when the message addresses every peer.
    #[inline]
    pub fn is_broadcast(&self) -> bool {
        self.recipient.is_empty()
    }

    /// Attaches a simulated signature over the envelope fields.
    pub fn sign(&mut self, key: &str) {
        self.signature = sha256_hex(&format!(
            "{}{}{}{}{}",
            self.sender, self.recipient, self.timestamp, self.sequence, key
        ));
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{} from {}", self.kind(), self.sequence, self.sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_payload_reports_its_message_type() {
        let cases: Vec<(Payload, MessageType)> = vec![
            (
                Payload::Handshake {
                    magic: "NILOTIC".into(),
                    version: 1,
                    node_id: "node-a".into(),
                    nonce: 1,
                    height: 1,
                },
                MessageType::Handshake,
            ),
            (Payload::Ping { nonce: 9, height: 3 }, MessageType::Ping),
            (Payload::Pong { nonce: 9 }, MessageType::Pong),
            (Payload::GetBlocks { from: 0, to: 10 }, MessageType::GetBlocks),
            (Payload::Blocks(vec![]), MessageType::Blocks),
            (Payload::GetTransactions, MessageType::GetTransactions),
            (Payload::Transactions(vec![]), MessageType::Transactions),
            (Payload::PeerList(vec![]), MessageType::PeerList),
            (
                Payload::ConsensusRequest { height: 4 },
                MessageType::ConsensusRequest,
            ),
        ];
        for (payload, expected) in cases {
            assert_eq!(payload.kind(), expected);
        }
    }

    #[test]
    fn an_empty_recipient_means_broadcast() {
        let broadcast = Message::new("node-a", "", 1, Payload::GetTransactions);
        assert!(broadcast.is_broadcast());
        let direct = Message::new("node-a", "node-b", 2, Payload::GetTransactions);
        assert!(!direct.is_broadcast());
    }

    #[test]
    fn signing_covers_the_envelope() {
        let mut message = Message::new("node-a", "node-b", 7, Payload::Pong { nonce: 1 });
        message.sign("key");
        let first = message.signature.clone();
        message.sequence += 1;
        message.sign("key");
        assert_ne!(message.signature, first);
    }
}
