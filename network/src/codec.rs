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

//! The wire codec: every message is one length-prefixed bincode frame.
//!
//! A frame is a 4-byte big-endian payload length followed by the encoded
//! `Message`. Frames above `MAX_MESSAGE_SIZE` are rejected before any
//! payload byte is read.

use crate::{Message, NetworkError, MAX_MESSAGE_SIZE};

use byteorder::{BigEndian, ByteOrder};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Encodes a message body without the length prefix.
pub fn serialize_message(message: &Message) -> Result<Vec<u8>, NetworkError> {
    Ok(bincode::serialize(message)?)
}

/// Decodes a message body.
pub fn deserialize_message(bytes: &[u8]) -> Result<Message, NetworkError> {
    Ok(bincode::deserialize(bytes)?)
}

/// Writes one framed message to the stream.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    message: &Message,
) -> Result<(), NetworkError> {
    let body = serialize_message(message)?;
    if body.len() > MAX_MESSAGE_SIZE {
        return Err(NetworkError::MessageTooBig(body.len(), MAX_MESSAGE_SIZE));
    }

    let mut header = [0u8; 4];
    BigEndian::write_u32(&mut header, body.len() as u32);
    writer.write_all(&header).await?;
    writer.write_all(&body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one framed message from the stream.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Message, NetworkError> {
    let mut header = [0u8; 4];
    reader.read_exact(&mut header).await?;
    let length = BigEndian::read_u32(&header) as usize;
    if length > MAX_MESSAGE_SIZE {
        return Err(NetworkError::MessageTooBig(length, MAX_MESSAGE_SIZE));
    }

    let mut body = vec![0u8; length];
    reader.read_exact(&mut body).await?;
    deserialize_message(&body)
}
