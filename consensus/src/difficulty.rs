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

use crate::ConsensusParameters;
use nilotic_storage::Ledger;

/// Computes the difficulty for the next window from the median observed
/// block interval over the last adjustment window.
///
/// The difficulty moves by at most one step per window: up when blocks
/// arrive in under half the target time, down when they take more than
/// twice the target, clamped to the configured bounds.
pub fn next_difficulty(parameters: &ConsensusParameters, ledger: &Ledger) -> u32 {
    let median = match median_block_interval(ledger, parameters.difficulty_adjustment_blocks) {
        Some(median) => median,
        None => return clamp(parameters, ledger.difficulty),
    };

    let current = ledger.difficulty;
    let adjusted = if median * 2 < parameters.target_block_time {
        current + 1
    } else if median > parameters.target_block_time * 2 {
        current.saturating_sub(1)
    } else {
        current
    };

    clamp(parameters, adjusted)
}

fn clamp(parameters: &ConsensusParameters, difficulty: u32) -> u32 {
    difficulty
        .max(parameters.min_difficulty)
        .min(parameters.max_difficulty)
}

/// The median of the intervals between consecutive blocks in the last
/// `window` blocks. Negative intervals from clock skew count as zero.
fn median_block_interval(ledger: &Ledger, window: u32) -> Option<i64> {
    let chain = ledger.chain();
    let take = (window as usize + 1).min(chain.len());
    if take < 2 {
        return None;
    }

    let tail = &chain[chain.len() - take..];
    let mut intervals: Vec<i64> = tail
        .windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).max(0))
        .collect();
    intervals.sort_unstable();
    Some(intervals[intervals.len() / 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilotic_objects::{Block, Transaction};

    fn parameters() -> ConsensusParameters {
        ConsensusParameters {
            difficulty_adjustment_blocks: 4,
            ..Default::default()
        }
    }

    /// Extends the ledger with empty blocks spaced `interval` seconds apart.
    fn grow_chain(ledger: &mut Ledger, blocks: u32, interval: i64) {
        for _ in 0..blocks {
            let head = ledger.latest_block();
            let mut block = Block::new(head.index + 1, head.hash.clone());
            block.timestamp = head.timestamp + interval;
            block
                .add_transaction(Transaction::coinbase("miner", 1.0))
                .unwrap();
            block.seal();
            ledger.apply_block(&block).unwrap();
        }
    }

    #[test]
    fn fast_blocks_raise_difficulty() {
        let parameters = parameters();
        let mut ledger = Ledger::new();
        grow_chain(&mut ledger, 4, parameters.target_block_time / 4);
        assert_eq!(next_difficulty(&parameters, &ledger), ledger.difficulty + 1);
    }

    #[test]
    fn slow_blocks_lower_difficulty() {
        let parameters = parameters();
        let mut ledger = Ledger::new();
        grow_chain(&mut ledger, 4, parameters.target_block_time * 3);
        assert_eq!(next_difficulty(&parameters, &ledger), ledger.difficulty - 1);
    }

    #[test]
    fn on_target_blocks_hold_difficulty() {
        let parameters = parameters();
        let mut ledger = Ledger::new();
        grow_chain(&mut ledger, 4, parameters.target_block_time);
        assert_eq!(next_difficulty(&parameters, &ledger), ledger.difficulty);
    }

    #[test]
    fn difficulty_is_clamped_to_the_configured_bounds() {
        let parameters = parameters();
        let mut ledger = Ledger::new();
        grow_chain(&mut ledger, 4, 0);

        ledger.difficulty = parameters.max_difficulty;
        assert_eq!(next_difficulty(&parameters, &ledger), parameters.max_difficulty);

        let mut slow = Ledger::new();
        grow_chain(&mut slow, 4, parameters.target_block_time * 3);
        slow.difficulty = parameters.min_difficulty;
        assert_eq!(next_difficulty(&parameters, &slow), parameters.min_difficulty);
    }
}
