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

mod node_lifecycle {
    use nilotic::{Config, Node, NodeError};
    use nilotic_consensus::ConsensusError;
    use nilotic_objects::GENESIS_ADDRESS;

    use rand::{thread_rng, Rng};

    fn test_config() -> Config {
        let nonce: u64 = thread_rng().gen();
        let mut config = Config::default();
        config.data_dir = std::env::temp_dir().join(format!("nilotic-node-{}", nonce));
        config.port = 0;
        config.node_id = format!("test-node-{}", nonce);
        config.consensus.mining_threads = 2;
        config
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn a_fresh_node_reports_genesis_state() {
        let node = Node::new(test_config()).unwrap();
        let info = node.node_info();
        assert_eq!(info.chain_height, 1);
        assert_eq!(info.difficulty, 4);
        assert_eq!(info.mining_reward, 100.0);
        assert_eq!(info.pending_transactions, 0);
        assert_eq!(node.balance_of(GENESIS_ADDRESS), 1000.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn transfer_mine_and_snapshot_round_trip() {
        let config = test_config();
        let node = Node::new(config.clone()).unwrap();

        node.submit_transaction(GENESIS_ADDRESS, "bob", 10.0).await.unwrap();
        assert_eq!(node.node_info().pending_transactions, 1);

        let block = node.mine_once(Some("alice".to_owned()), 0).await.unwrap();
        assert_eq!(block.index, 1);
        assert_eq!(node.node_info().chain_height, 2);
        assert_eq!(node.node_info().pending_transactions, 0);
        assert_eq!(node.balance_of("bob"), 10.0);
        assert_eq!(node.balance_of(GENESIS_ADDRESS), 990.0);
        // The coinbase paid the reward plus the flat fee, and the fee burn
        // took back half of that fee.
        assert_eq!(node.balance_of("alice"), 100.0 + 1.0 - 0.5);

        node.save_snapshot().unwrap();
        let restored = Node::new(config).unwrap();
        assert_eq!(restored.node_info().chain_height, 2);
        assert_eq!(restored.balance_of("bob"), 10.0);
        assert_eq!(restored.balance_of("alice"), 100.5);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn an_unfunded_transfer_is_rejected_up_front() {
        let node = Node::new(test_config()).unwrap();
        let result = node.submit_transaction("bob", "dave", 50.0).await;
        assert!(matches!(
            result,
            Err(NodeError::Consensus(ConsensusError::InsufficientFunds { .. }))
        ));
        assert_eq!(node.node_info().pending_transactions, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn start_and_stop_are_clean_and_idempotent() {
        let config = test_config();
        let snapshot_path = config.snapshot_path();
        let node = Node::new(config).unwrap();

        node.start().await.unwrap();
        node.start().await.unwrap();
        node.stop().await;
        node.stop().await;

        assert!(snapshot_path.exists());
        let restored = Node::new(test_config()).unwrap();
        assert_eq!(restored.node_info().chain_height, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn the_stake_path_selects_and_rewards_a_validator() {
        let node = Node::new(test_config()).unwrap();
        node.stake(GENESIS_ADDRESS, 400.0).unwrap();
        assert_eq!(node.select_validator(), Some(GENESIS_ADDRESS.to_owned()));

        let block = node.forge_block_pos(GENESIS_ADDRESS, "attestation-sig").await.unwrap();
        assert_eq!(block.validator.as_deref(), Some(GENESIS_ADDRESS));
        assert_eq!(node.node_info().chain_height, 2);
        // balance: 1000 - 400 staked + 40 attestation bonus.
        assert_eq!(node.balance_of(GENESIS_ADDRESS), 640.0);

        node.unstake(GENESIS_ADDRESS, 400.0).unwrap();
        assert_eq!(node.balance_of(GENESIS_ADDRESS), 1040.0);
    }
}
