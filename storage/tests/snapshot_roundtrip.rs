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

mod snapshot_roundtrip {
    use nilotic_objects::{Block, Transaction, GENESIS_ADDRESS};
    use nilotic_storage::{Ledger, Snapshot, StorageError};

    use rand::{thread_rng, Rng};
    use std::{fs, path::PathBuf};

    fn random_snapshot_path() -> PathBuf {
        let nonce: u64 = thread_rng().gen();
        let mut path = std::env::temp_dir();
        path.push(format!("nilotic-snapshot-{}.json", nonce));
        path
    }

    fn populated_ledger() -> Ledger {
        let mut ledger = Ledger::new();

        let head = ledger.latest_block().clone();
        let mut block = Block::new(head.index + 1, head.hash);
        block.add_transaction(Transaction::coinbase("miner", 100.0)).unwrap();
        let mut transfer = Transaction::new(GENESIS_ADDRESS, "bob", 25.0);
        transfer.sign("genesis-key");
        block.add_transaction(transfer).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        ledger.stake("bob", 10.0).unwrap();
        ledger.burn_from("miner", 0.5);
        ledger
    }

    #[test]
    fn save_and_restore_preserve_all_state() {
        let ledger = populated_ledger();
        let mut pending = Transaction::new("bob", "carol", 1.0);
        pending.sign("bob-key");
        let path = random_snapshot_path();

        Snapshot::capture(&ledger, vec![pending.clone()])
            .save(&path)
            .unwrap();
        let (restored, restored_pending) = Snapshot::load(&path).unwrap().restore();

        assert_eq!(restored.height(), ledger.height());
        assert_eq!(restored.latest_block(), ledger.latest_block());
        assert_eq!(restored.balances(), ledger.balances());
        assert_eq!(restored.stakes(), ledger.stakes());
        assert_eq!(restored.burned(), ledger.burned());
        assert_eq!(restored.minted(), ledger.minted());
        assert_eq!(restored.difficulty, ledger.difficulty);
        assert_eq!(restored.mining_reward, ledger.mining_reward);
        assert_eq!(restored.transaction_fee, ledger.transaction_fee);
        assert_eq!(restored_pending, vec![pending]);
        assert_eq!(restored.validate_chain(), None);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn restored_chain_accepts_new_blocks() {
        let ledger = populated_ledger();
        let path = random_snapshot_path();
        Snapshot::capture(&ledger, vec![]).save(&path).unwrap();
        let (mut restored, _) = Snapshot::load(&path).unwrap().restore();

        let head = restored.latest_block().clone();
        let mut block = Block::new(head.index + 1, head.hash);
        block.add_transaction(Transaction::coinbase("miner", 100.0)).unwrap();
        block.seal();
        restored.apply_block(&block).unwrap();
        assert_eq!(restored.height(), ledger.height() + 1);

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corrupt_snapshot_refuses_to_load() {
        let path = random_snapshot_path();
        fs::write(&path, "{ not json").unwrap();

        match Snapshot::load(&path) {
            Err(StorageError::CorruptSnapshot(..)) => {}
            other => panic!("expected a corrupt-snapshot error, got {:?}", other.map(|_| ())),
        }

        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_snapshot_surfaces_an_io_error() {
        let path = random_snapshot_path();
        assert!(matches!(Snapshot::load(&path), Err(StorageError::Io(_))));
    }
}
