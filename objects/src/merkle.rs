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

use crate::{hash::sha256_hex, EMPTY_MERKLE_ROOT};

/// Reduces a list of transaction digests into a Merkle root.
///
/// Pairs are combined as `SHA-256(left ++ right)`; a level with an odd number
/// of elements duplicates its last element before pairing. The root of an
/// empty list is the `"0"` marker, and the root of a single digest is that
/// digest itself.
pub fn merkle_root(mut hashes: Vec<String>) -> String {
    if hashes.is_empty() {
        return EMPTY_MERKLE_ROOT.to_owned();
    }

    while hashes.len() > 1 {
        if hashes.len() % 2 == 1 {
            let last = hashes[hashes.len() - 1].clone();
            hashes.push(last);
        }

        hashes = hashes
            .chunks(2)
            .map(|pair| sha256_hex(&format!("{}{}", pair[0], pair[1])))
            .collect();
    }

    hashes.swap_remove(0)
}
