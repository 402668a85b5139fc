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

use nilotic_consensus::ConsensusError;

use std::net::SocketAddr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("a {0}-byte message exceeds the {1}-byte cap")]
    MessageTooBig(usize, usize),

    #[error("handshake carried magic {0:?} instead of the expected prefix")]
    BadMagic(String),

    #[error("handshake carried protocol version {0}")]
    WrongVersion(u8),

    #[error("the handshake was not completed in time")]
    HandshakeTimeout,

    #[error("the handshake did not start with a handshake message")]
    HandshakeExpected,

    #[error("{0} is already connected")]
    PeerAlreadyConnected(SocketAddr),

    #[error("{0} is not connected")]
    PeerNotConnected(SocketAddr),

    #[error("message sequence {got} from {peer} is not after {last}")]
    StaleSequence { peer: SocketAddr, last: u64, got: u64 },

    #[error("the connection to {0} is closed")]
    ChannelClosed(SocketAddr),

    #[error("the server is shutting down")]
    Shutdown,

    #[error(transparent)]
    Bincode(#[from] Box<bincode::ErrorKind>),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),
}
