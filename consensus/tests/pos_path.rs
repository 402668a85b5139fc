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

mod pos_path {
    use nilotic_consensus::{pos, ConsensusError};
    use nilotic_objects::{Block, GENESIS_ADDRESS};
    use nilotic_testing::consensus::*;

    fn candidate_block(ledger: &parking_lot::RwLock<nilotic_storage::Ledger>) -> Block {
        let ledger = ledger.read();
        let head = ledger.latest_block();
        Block::new(head.index + 1, head.hash.clone())
    }

    #[test]
    fn an_attested_block_is_accepted_without_proof_of_work() {
        let ledger = test_ledger();
        let pool = test_pool();
        ledger.write().stake(GENESIS_ADDRESS, 400.0).unwrap();
        // A hash target this steep would never be met by an unmined block.
        ledger.write().difficulty = 8;

        let block = candidate_block(&ledger);
        let accepted = pos::validate_block_pos(
            &TEST_PARAMETERS,
            &ledger,
            &pool,
            block,
            GENESIS_ADDRESS,
            "attestation-sig",
        )
        .unwrap();

        let ledger = ledger.read();
        assert_eq!(ledger.height(), 2);
        assert_eq!(accepted.validator.as_deref(), Some(GENESIS_ADDRESS));
        // The attestation bonus: mining_reward x stake / 1000.
        assert_eq!(ledger.balance_of(GENESIS_ADDRESS), 600.0 + 40.0);
        assert_eq!(ledger.stake_of(GENESIS_ADDRESS), 400.0);
    }

    #[test]
    fn an_unstaked_address_cannot_attest() {
        let ledger = test_ledger();
        let pool = test_pool();

        let block = candidate_block(&ledger);
        let result = pos::validate_block_pos(
            &TEST_PARAMETERS,
            &ledger,
            &pool,
            block,
            "nobody",
            "attestation-sig",
        );
        assert!(matches!(result, Err(ConsensusError::NotAValidator(_))));
        assert_eq!(ledger.read().height(), 1);
    }

    #[test]
    fn an_empty_attestation_signature_is_rejected() {
        let ledger = test_ledger();
        let pool = test_pool();
        ledger.write().stake(GENESIS_ADDRESS, 100.0).unwrap();

        let block = candidate_block(&ledger);
        let result =
            pos::validate_block_pos(&TEST_PARAMETERS, &ledger, &pool, block, GENESIS_ADDRESS, "");
        assert!(matches!(result, Err(ConsensusError::NotAValidator(_))));
    }

    #[test]
    fn validator_gating_holds_for_incoming_attested_blocks() {
        let ledger = test_ledger();
        ledger.write().stake(GENESIS_ADDRESS, 100.0).unwrap();

        let mut block = candidate_block(&ledger);
        block.validator = Some("imposter".to_owned());
        block.signature = Some("sig".to_owned());
        block.seal();

        let guard = ledger.read();
        match TEST_PARAMETERS.verify_block(&guard, &block) {
            Err(ConsensusError::NotAValidator(address)) => assert_eq!(address, "imposter"),
            other => panic!("expected a validator rejection, got {:?}", other.err()),
        }
    }

    #[test]
    fn proof_of_work_still_applies_after_staking() {
        let ledger = test_ledger();
        let pool = test_pool();
        ledger.write().stake(GENESIS_ADDRESS, 100.0).unwrap();

        // The stake table does not exempt plain blocks from the target.
        let miner = test_miner("alice");
        let block = miner.mine_block(&ledger, &pool, 0).unwrap();
        assert!(block.validator.is_none());
        assert!(block.meets_difficulty(TEST_DIFFICULTY));
    }
}
