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

//! The proof-of-stake validator path. Stake bookkeeping lives on the
//! ledger; this module selects validators and attests blocks. A block is
//! either proof-of-work or validator-attested, never both: an attested
//! block is accepted without the difficulty target check.

use crate::{ConsensusError, ConsensusParameters, MemoryPool, STAKE_REWARD_DIVISOR};
use nilotic_objects::{Block, Transaction};
use nilotic_storage::Ledger;

use parking_lot::{Mutex, RwLock};
use std::cmp::Ordering;

/// Selects the validator for the next block: the address with the largest
/// stake, ties broken toward the lexicographically smaller address.
pub fn select_validator(ledger: &Ledger) -> Option<String> {
    ledger
        .stakes()
        .iter()
        .filter(|(_, stake)| **stake > 0.0)
        .max_by(|(a_address, a_stake), (b_address, b_stake)| {
            a_stake
                .partial_cmp(b_stake)
                .unwrap_or(Ordering::Equal)
                .then_with(|| b_address.cmp(a_address))
        })
        .map(|(address, _)| address.clone())
}

/// Attests and appends a block on the proof-of-stake path.
///
/// The validator must hold stake; the attestation attaches the validator
/// and signature to the header and appends a secondary coinbase paying
/// `mining_reward x stake / 1000` to the validator before the block is
/// received.
pub fn validate_block_pos(
    parameters: &ConsensusParameters,
    ledger: &RwLock<Ledger>,
    memory_pool: &Mutex<MemoryPool>,
    mut block: Block,
    validator: &str,
    signature: &str,
) -> Result<Block, ConsensusError> {
    if signature.is_empty() {
        return Err(ConsensusError::NotAValidator(validator.to_owned()));
    }

    let bonus = {
        let ledger = ledger.read();
        let stake = ledger.stake_of(validator);
        if stake <= 0.0 {
            return Err(ConsensusError::NotAValidator(validator.to_owned()));
        }
        ledger.mining_reward * stake / STAKE_REWARD_DIVISOR
    };

    block.add_transaction(Transaction::coinbase(validator, bonus))?;
    block.validator = Some(validator.to_owned());
    block.signature = Some(signature.to_owned());
    block.seal();

    parameters.receive_block(ledger, memory_pool, &block)?;
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilotic_objects::GENESIS_ADDRESS;

    #[test]
    fn selection_prefers_the_largest_stake() {
        let mut ledger = Ledger::new();
        let mut block = Block::new(1, ledger.latest_block().hash.clone());
        block.add_transaction(Transaction::coinbase("val-a", 100.0)).unwrap();
        block.add_transaction(Transaction::coinbase("val-b", 100.0)).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        ledger.stake("val-a", 10.0).unwrap();
        ledger.stake("val-b", 40.0).unwrap();
        assert_eq!(select_validator(&ledger), Some("val-b".to_owned()));
    }

    #[test]
    fn ties_break_toward_the_smaller_address() {
        let mut ledger = Ledger::new();
        let mut block = Block::new(1, ledger.latest_block().hash.clone());
        block.add_transaction(Transaction::coinbase("val-b", 50.0)).unwrap();
        block.add_transaction(Transaction::coinbase("val-a", 50.0)).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        ledger.stake("val-a", 25.0).unwrap();
        ledger.stake("val-b", 25.0).unwrap();
        assert_eq!(select_validator(&ledger), Some("val-a".to_owned()));
    }

    #[test]
    fn no_stakes_means_no_validator() {
        let ledger = Ledger::new();
        assert_eq!(select_validator(&ledger), None);
        assert_eq!(ledger.stake_of(GENESIS_ADDRESS), 0.0);
    }
}
