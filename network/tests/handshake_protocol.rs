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

mod handshake_protocol {
    use nilotic_consensus::{BlockHook, MemoryPool};
    use nilotic_network::{
        read_message,
        write_message,
        Message,
        MessageType,
        Payload,
        Server,
        ServerConfig,
        PROTOCOL_MAGIC,
        PROTOCOL_VERSION,
    };
    use nilotic_objects::Block;
    use nilotic_storage::Ledger;
    use nilotic_testing::consensus::*;

    use parking_lot::{Mutex, RwLock};
    use serial_test::serial;
    use std::{
        net::SocketAddr,
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };
    use tokio::{net::TcpStream, time::sleep};

    struct TestNode {
        server: Server,
        address: SocketAddr,
        ledger: Arc<RwLock<Ledger>>,
        pool: Arc<Mutex<MemoryPool>>,
        accepted_blocks: Arc<AtomicUsize>,
    }

    async fn started_node(node_id: &str) -> TestNode {
        let ledger = test_ledger();
        let pool = test_pool();
        let accepted_blocks = Arc::new(AtomicUsize::new(0));
        let hook: BlockHook = {
            let counter = Arc::clone(&accepted_blocks);
            Arc::new(move |_block: &Block| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };

        let config = ServerConfig {
            node_id: node_id.to_owned(),
            listen_address: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = Server::new(
            config,
            Arc::clone(&TEST_PARAMETERS),
            Arc::clone(&ledger),
            Arc::clone(&pool),
            hook,
        );
        let address = server.start().await.unwrap();
        TestNode {
            server,
            address,
            ledger,
            pool,
            accepted_blocks,
        }
    }

    /// A raw socket standing in for a remote peer.
    struct RawPeer {
        stream: TcpStream,
        sequence: u64,
    }

    impl RawPeer {
        async fn connect(address: SocketAddr) -> Self {
            let stream = TcpStream::connect(address).await.unwrap();
            Self { stream, sequence: 0 }
        }

        fn message(&mut self, payload: Payload) -> Message {
            self.sequence += 1;
            let mut message = Message::new("raw-peer", "", self.sequence, payload);
            message.sign("raw-peer-key");
            message
        }

        async fn send(&mut self, payload: Payload) {
            let message = self.message(payload);
            write_message(&mut self.stream, &message).await.unwrap();
        }

        async fn send_with_sequence(&mut self, sequence: u64, payload: Payload) {
            let mut message = Message::new("raw-peer", "", sequence, payload);
            message.sign("raw-peer-key");
            write_message(&mut self.stream, &message).await.unwrap();
        }

        async fn read(&mut self) -> Message {
            read_message(&mut self.stream).await.unwrap()
        }

        async fn handshake(&mut self, height: u32) -> Message {
            self.send(Payload::Handshake {
                magic: PROTOCOL_MAGIC.to_owned(),
                version: PROTOCOL_VERSION,
                node_id: "raw-peer".to_owned(),
                nonce: 7,
                height,
            })
            .await;
            let response = self.read().await;
            assert_eq!(response.kind(), MessageType::Handshake);
            response
        }
    }

    async fn eventually<F: Fn() -> bool>(limit: Duration, condition: F) {
        let start = std::time::Instant::now();
        while !condition() {
            if start.elapsed() > limit {
                panic!("timed out!");
            }
            sleep(Duration::from_millis(10)).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[serial]
    async fn handshake_then_ping_pong() {
        let node = started_node("server-a").await;
        let mut peer = RawPeer::connect(node.address).await;

        // 1. The peer opens with a handshake and gets one back.
        let response = peer.handshake(1).await;
        assert_eq!(response.sender, "server-a");

        // 2. The server registers the connection.
        eventually(Duration::from_secs(5), || {
            node.server.peer_book().read().connected_count() == 1
        })
        .await;

        // 3. A ping comes back as a pong with the same nonce.
        peer.send(Payload::Ping { nonce: 41, height: 1 }).await;
        let pong = peer.read().await;
        match pong.payload {
            Payload::Pong { nonce } => assert_eq!(nonce, 41),
            other => panic!("expected a pong, got {}", other),
        }

        node.server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[serial]
    async fn a_mismatched_handshake_is_rejected() {
        let node = started_node("server-b").await;
        let mut peer = RawPeer::connect(node.address).await;

        peer.send(Payload::Handshake {
            magic: "NOTNILO".to_owned(),
            version: PROTOCOL_VERSION,
            node_id: "raw-peer".to_owned(),
            nonce: 7,
            height: 1,
        })
        .await;

        // The server closes the connection without registering the peer.
        let closed = read_message(&mut peer.stream).await;
        assert!(closed.is_err());
        assert_eq!(node.server.peer_book().read().connected_count(), 0);

        node.server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[serial]
    async fn out_of_order_messages_are_dropped() {
        let node = started_node("server-c").await;
        let mut peer = RawPeer::connect(node.address).await;
        peer.handshake(1).await;

        let kept = signed_transaction("GENESIS", "bob", 1.0);
        let dropped = signed_transaction("GENESIS", "carol", 2.0);

        // Sequence 5 advances the window; 3 regresses and must be ignored.
        peer.send_with_sequence(5, Payload::NewTransaction(kept.clone())).await;
        peer.send_with_sequence(3, Payload::NewTransaction(dropped)).await;

        eventually(Duration::from_secs(5), || node.pool.lock().len() == 1).await;
        sleep(Duration::from_millis(100)).await;
        assert_eq!(node.pool.lock().len(), 1);
        assert_eq!(node.pool.lock().candidates(10)[0].hash, kept.hash);

        node.server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[serial]
    async fn a_new_block_broadcast_extends_the_remote_chain() {
        let node_a = started_node("server-d").await;
        let node_b = started_node("server-e").await;

        node_a.server.connect(node_b.address).await.unwrap();
        eventually(Duration::from_secs(5), || {
            node_b.server.peer_book().read().connected_count() == 1
        })
        .await;

        // Node A mines locally, then announces the block.
        let miner = test_miner("alice");
        let block = miner.mine_block(&node_a.ledger, &node_a.pool, 0).unwrap();
        node_a.server.broadcast(Payload::NewBlock(block.clone()), None).await;

        eventually(Duration::from_secs(5), || node_b.ledger.read().height() == 2).await;
        assert_eq!(node_b.ledger.read().latest_block().hash, block.hash);
        assert_eq!(node_b.accepted_blocks.load(Ordering::SeqCst), 1);
        // The miner's own chain was already extended synchronously.
        assert_eq!(node_a.ledger.read().height(), 2);

        node_a.server.stop().await;
        node_b.server.stop().await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    #[serial]
    async fn transaction_gossip_reaches_the_pool_and_propagates() {
        let node_a = started_node("server-f").await;
        let node_b = started_node("server-g").await;
        node_a.server.connect(node_b.address).await.unwrap();

        eventually(Duration::from_secs(5), || {
            node_a.server.peer_book().read().connected_count() == 1
                && node_b.server.peer_book().read().connected_count() == 1
        })
        .await;

        let transaction = signed_transaction("GENESIS", "bob", 3.0);
        let mut peer = RawPeer::connect(node_b.address).await;
        peer.handshake(1).await;
        peer.send(Payload::NewTransaction(transaction.clone())).await;

        // Node B pools the transaction and forwards it to node A.
        eventually(Duration::from_secs(5), || node_b.pool.lock().len() == 1).await;
        eventually(Duration::from_secs(5), || node_a.pool.lock().len() == 1).await;
        assert_eq!(node_a.pool.lock().candidates(1)[0].hash, transaction.hash);

        node_a.server.stop().await;
        node_b.server.stop().await;
    }
}
