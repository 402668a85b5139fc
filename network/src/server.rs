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

use crate::{
    codec::{read_message, write_message},
    Message,
    NetworkError,
    Outbound,
    Payload,
    PeerBook,
    HANDSHAKE_TIMEOUT_SECS,
    INBOUND_CHANNEL_CAPACITY,
    MAX_BLOCKS_PER_RESPONSE,
    PING_INTERVAL_SECS,
    PROTOCOL_MAGIC,
    PROTOCOL_VERSION,
};
use nilotic_consensus::{BlockHook, ConsensusParameters, MemoryPool, Miner};
use nilotic_objects::Block;
use nilotic_storage::Ledger;

use parking_lot::{Mutex as SyncMutex, RwLock};
use rand::{thread_rng, Rng};
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpListener,
        TcpStream,
    },
    sync::{mpsc, Notify},
    task::JoinHandle,
    time::timeout,
};

/// The networking parameters of this node.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// This node's identifier, sent in every message envelope.
    pub node_id: String,
    /// The address the listener binds to.
    pub listen_address: SocketAddr,
    /// The maximum number of peers permitted to maintain connections with.
    pub max_peers: u16,
    /// Seconds a pending handshake may take before the connection closes.
    pub handshake_timeout_secs: u64,
    /// Seconds between keep-alive pings.
    pub ping_interval_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let nonce: u64 = thread_rng().gen();
        Self {
            node_id: format!("node-{:016x}", nonce),
            listen_address: "0.0.0.0:5500".parse().expect("a valid default listen address"),
            max_peers: 50,
            handshake_timeout_secs: HANDSHAKE_TIMEOUT_SECS,
            ping_interval_secs: PING_INTERVAL_SECS,
        }
    }
}

/// A core data structure for operating the networking stack of this node.
///
/// Each connected peer gets a reader and a writer task; readers funnel into
/// one bounded processing queue so message handling is single-threaded and
/// per-peer ordering is preserved end to end.
#[derive(Clone)]
pub struct Server {
    config: Arc<ServerConfig>,
    parameters: Arc<ConsensusParameters>,
    ledger: Arc<RwLock<Ledger>>,
    memory_pool: Arc<SyncMutex<MemoryPool>>,
    peer_book: Arc<RwLock<PeerBook>>,
    outbound: Outbound,
    /// The monotonic sequence stamped on outgoing messages.
    sequence: Arc<AtomicU64>,
    /// Invoked for every block this server accepts onto the chain.
    block_hook: BlockHook,
    local_address: Arc<RwLock<Option<SocketAddr>>>,
    inbound_sender: mpsc::Sender<(SocketAddr, Message)>,
    inbound_receiver: Arc<SyncMutex<Option<mpsc::Receiver<(SocketAddr, Message)>>>>,
    /// Messages consumed by the central processor since startup.
    messages_received: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
    shutdown_signal: Arc<Notify>,
    tasks: Arc<SyncMutex<Vec<JoinHandle<()>>>>,
}

impl Server {
    /// Creates a new instance of `Server`. Nothing is bound or spawned
    /// until `start`.
    pub fn new(
        config: ServerConfig,
        parameters: Arc<ConsensusParameters>,
        ledger: Arc<RwLock<Ledger>>,
        memory_pool: Arc<SyncMutex<MemoryPool>>,
        block_hook: BlockHook,
    ) -> Self {
        let (inbound_sender, inbound_receiver) = mpsc::channel(INBOUND_CHANNEL_CAPACITY);
        Self {
            config: Arc::new(config),
            parameters,
            ledger,
            memory_pool,
            peer_book: Arc::new(RwLock::new(PeerBook::new())),
            outbound: Outbound::new(),
            sequence: Arc::new(AtomicU64::new(0)),
            block_hook,
            local_address: Arc::new(RwLock::new(None)),
            inbound_sender,
            inbound_receiver: Arc::new(SyncMutex::new(Some(inbound_receiver))),
            messages_received: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
            shutdown_signal: Arc::new(Notify::new()),
            tasks: Arc::new(SyncMutex::new(vec![])),
        }
    }

    /// Spawns a task tracked for shutdown.
    fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(future);
        self.tasks.lock().push(handle);
    }

    /// Returns the bound listener address once `start` has succeeded.
    pub fn local_address(&self) -> Option<SocketAddr> {
        *self.local_address.read()
    }

    /// Returns a snapshot of the peer book.
    pub fn peer_book(&self) -> &Arc<RwLock<PeerBook>> {
        &self.peer_book
    }

    /// Returns this node's identifier.
    pub fn node_id(&self) -> &str {
        &self.config.node_id
    }

    /// Returns `(sent, received)` message counts since startup.
    pub fn message_counts(&self) -> (u64, u64) {
        let (sent, _failed) = self.outbound.counts();
        (sent, self.messages_received.load(Ordering::Relaxed))
    }

    /// Binds the listener and spawns the accept, processing, and
    /// keep-alive tasks. Returns the bound address.
    pub async fn start(&self) -> Result<SocketAddr, NetworkError> {
        let listener = TcpListener::bind(self.config.listen_address).await?;
        let local_address = listener.local_addr()?;
        *self.local_address.write() = Some(local_address);
        info!("listening on {}", local_address);

        // The accept loop.
        let server = self.clone();
        self.spawn(async move {
            loop {
                tokio::select! {
                    _ = server.shutdown_signal.notified() => break,
                    accepted = listener.accept() => match accepted {
                        Ok((stream, remote_address)) => {
                            if server.peer_book.read().connected_count() >= server.config.max_peers as usize {
                                debug!("refusing {}: peer limit reached", remote_address);
                                continue;
                            }
                            let server = server.clone();
                            tokio::spawn(async move {
                                if let Err(error) = server.accept_connection(stream, remote_address).await {
                                    debug!("inbound connection from {} failed: {}", remote_address, error);
                                }
                            });
                        }
                        Err(error) => {
                            warn!("failed to accept a connection: {}", error);
                        }
                    }
                }
            }
        });

        // The central message processor.
        let server = self.clone();
        let mut receiver = self
            .inbound_receiver
            .lock()
            .take()
            .expect("the server can only be started once");
        self.spawn(async move {
            loop {
                tokio::select! {
                    _ = server.shutdown_signal.notified() => break,
                    received = receiver.recv() => match received {
                        Some((remote_address, message)) => {
                            server.messages_received.fetch_add(1, Ordering::Relaxed);
                            server.handle_message(remote_address, message).await;
                        }
                        None => break,
                    }
                }
            }
        });

        // The keep-alive loop.
        let server = self.clone();
        self.spawn(async move {
            let interval = Duration::from_secs(server.config.ping_interval_secs);
            loop {
                tokio::select! {
                    _ = server.shutdown_signal.notified() => break,
                    _ = tokio::time::sleep(interval) => server.ping_peers().await,
                }
            }
        });

        Ok(local_address)
    }

    /// Signals every task to stop, closes peer queues, and clears state.
    pub async fn stop(&self) {
        if self.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown_signal.notify_waiters();

        let tasks = {
            let mut tasks = self.tasks.lock();
            tasks.drain(..).collect::<Vec<_>>()
        };
        for task in tasks {
            task.abort();
        }

        let addresses = self.peer_book.read().connected_addresses();
        for address in addresses {
            self.outbound.deregister(&address);
            self.peer_book.write().set_disconnected(address);
        }
        info!("network server stopped");
    }

    /// Dials a remote peer and performs the handshake as the initiator.
    pub async fn connect(&self, remote_address: SocketAddr) -> Result<(), NetworkError> {
        if self.peer_book.read().is_connected(&remote_address) {
            return Err(NetworkError::PeerAlreadyConnected(remote_address));
        }

        let stream = TcpStream::connect(remote_address).await?;
        let (mut reader, mut writer) = stream.into_split();

        // Send our handshake and await the peer's within the timeout.
        let handshake = self.handshake_message();
        write_message(&mut writer, &handshake).await?;

        let deadline = Duration::from_secs(self.config.handshake_timeout_secs);
        let response = timeout(deadline, read_message(&mut reader))
            .await
            .map_err(|_| NetworkError::HandshakeTimeout)??;

        let node_id = self.validate_handshake(&response)?;
        info!("connected to {} ({})", remote_address, node_id);
        self.finalize_peer(reader, writer, remote_address, &node_id);
        Ok(())
    }

    /// Performs the handshake as the responder on an accepted connection.
    async fn accept_connection(
        &self,
        stream: TcpStream,
        remote_address: SocketAddr,
    ) -> Result<(), NetworkError> {
        let (mut reader, mut writer) = stream.into_split();

        let deadline = Duration::from_secs(self.config.handshake_timeout_secs);
        let request = timeout(deadline, read_message(&mut reader))
            .await
            .map_err(|_| NetworkError::HandshakeTimeout)??;

        // A rejected handshake closes the connection by dropping it here.
        let node_id = self.validate_handshake(&request)?;
        write_message(&mut writer, &self.handshake_message()).await?;

        info!("accepted {} ({})", remote_address, node_id);
        self.finalize_peer(reader, writer, remote_address, &node_id);
        Ok(())
    }

    /// Builds this node's handshake message.
    fn handshake_message(&self) -> Message {
        let height = self.ledger.read().height();
        self.envelope(
            String::new(),
            Payload::Handshake {
                magic: PROTOCOL_MAGIC.to_owned(),
                version: PROTOCOL_VERSION,
                node_id: self.config.node_id.clone(),
                nonce: thread_rng().gen(),
                height,
            },
        )
    }

    /// Checks the magic prefix and protocol version of a peer handshake
    /// and returns the peer's node id.
    fn validate_handshake(&self, message: &Message) -> Result<String, NetworkError> {
        match &message.payload {
            Payload::Handshake {
                magic,
                version,
                node_id,
                ..
            } => {
                if magic != PROTOCOL_MAGIC {
                    return Err(NetworkError::BadMagic(magic.clone()));
                }
                if *version != PROTOCOL_VERSION {
                    return Err(NetworkError::WrongVersion(*version));
                }
                Ok(node_id.clone())
            }
            _ => Err(NetworkError::HandshakeExpected),
        }
    }

    /// Registers a handshaken peer and spawns its reader and writer tasks.
    fn finalize_peer(
        &self,
        mut reader: OwnedReadHalf,
        mut writer: OwnedWriteHalf,
        remote_address: SocketAddr,
        node_id: &str,
    ) {
        self.peer_book.write().set_connected(remote_address, node_id);

        let (writer_sender, mut writer_receiver) = mpsc::channel::<Message>(256);
        self.outbound.register(remote_address, writer_sender);

        // The writer drains this peer's queue until it closes.
        let server = self.clone();
        self.spawn(async move {
            while let Some(message) = writer_receiver.recv().await {
                if let Err(error) = write_message(&mut writer, &message).await {
                    debug!("failed to write a {} to {}: {}", message, remote_address, error);
                    break;
                }
            }
            server.drop_peer(remote_address);
        });

        // The reader forwards framed messages into the processing queue,
        // enforcing monotonic per-peer sequences.
        let server = self.clone();
        self.spawn(async move {
            loop {
                let message = match read_message(&mut reader).await {
                    Ok(message) => message,
                    Err(error) => {
                        debug!("the connection to {} ended: {}", remote_address, error);
                        break;
                    }
                };

                let advanced = server
                    .peer_book
                    .read()
                    .get(&remote_address)
                    .map_or(false, |peer| peer.advance_sequence(message.sequence));
                if !advanced {
                    debug!(
                        "dropping an out-of-order {} from {}",
                        message, remote_address
                    );
                    continue;
                }

                if server.inbound_sender.send((remote_address, message)).await.is_err() {
                    break;
                }
            }
            server.drop_peer(remote_address);
        });
    }

    /// Removes a peer's queue and marks it disconnected.
    fn drop_peer(&self, remote_address: SocketAddr) {
        self.outbound.deregister(&remote_address);
        self.peer_book.write().set_disconnected(remote_address);
    }

    /// Stamps and signs an envelope for the given payload.
    fn envelope(&self, recipient: String, payload: Payload) -> Message {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut message = Message::new(self.config.node_id.clone(), recipient, sequence, payload);
        message.sign(&format!("{}-key", self.config.node_id));
        message
    }

    /// Sends a payload to one peer.
    pub async fn send(&self, remote_address: SocketAddr, payload: Payload) -> Result<(), NetworkError> {
        let message = self.envelope(remote_address.to_string(), payload);
        self.outbound.send(remote_address, message).await
    }

    /// Broadcasts a payload to every connected peer except `skip`.
    pub async fn broadcast(&self, payload: Payload, skip: Option<SocketAddr>) {
        let message = self.envelope(String::new(), payload);
        self.outbound.broadcast(&message, skip).await;
    }

    /// Pings every connected peer; a peer missing two cycles is dropped.
    async fn ping_peers(&self) {
        let peers = self.peer_book.read().connected_peers();
        let height = self.ledger.read().height();

        for peer in peers {
            let address = peer.address();
            let quality = peer.quality.clone();

            if quality.expecting_pong.load(Ordering::SeqCst) {
                let missed = quality.missed_pongs.fetch_add(1, Ordering::SeqCst) + 1;
                if missed >= 2 {
                    info!("{} missed {} ping cycles, disconnecting", address, missed);
                    self.drop_peer(address);
                    continue;
                }
            }

            let nonce: u64 = thread_rng().gen();
            quality.last_ping_nonce.store(nonce, Ordering::SeqCst);
            quality.expecting_pong.store(true, Ordering::SeqCst);
            if let Err(error) = self.send(address, Payload::Ping { nonce, height }).await {
                debug!("failed to ping {}: {}", address, error);
            }
        }
    }

    /// Applies one inbound message. Runs on the central processing task,
    /// so handling is serialized in arrival order.
    async fn handle_message(&self, source: SocketAddr, message: Message) {
        trace!("handling a {} from {}", message, source);

        match message.payload.clone() {
            Payload::Handshake { .. } => {
                debug!("{} re-sent a handshake mid-session", source);
            }
            Payload::Ping { nonce, height } => {
                if height > self.ledger.read().height() {
                    let from = self.ledger.read().height();
                    let _ = self.send(source, Payload::GetBlocks { from, to: height }).await;
                }
                let _ = self.send(source, Payload::Pong { nonce }).await;
            }
            Payload::Pong { nonce } => {
                if let Some(peer) = self.peer_book.read().get(&source) {
                    let expected = peer.quality.last_ping_nonce.load(Ordering::SeqCst);
                    if expected == nonce {
                        peer.quality.expecting_pong.store(false, Ordering::SeqCst);
                        peer.quality.missed_pongs.store(0, Ordering::SeqCst);
                    }
                }
            }
            Payload::GetBlocks { from, to } => {
                let blocks: Vec<Block> = {
                    let ledger = self.ledger.read();
                    (from..=to)
                        .take(MAX_BLOCKS_PER_RESPONSE)
                        .filter_map(|index| ledger.get_block(index).cloned())
                        .collect()
                };
                let _ = self.send(source, Payload::Blocks(blocks)).await;
            }
            Payload::Blocks(blocks) => {
                for block in blocks {
                    self.receive_block(source, block, false);
                }
            }
            Payload::GetTransactions => {
                let pending = self.memory_pool.lock().transactions();
                let _ = self.send(source, Payload::Transactions(pending)).await;
            }
            Payload::Transactions(transactions) => {
                for transaction in transactions {
                    let ledger = self.ledger.read();
                    if let Err(error) = self.memory_pool.lock().insert(&ledger, transaction) {
                        trace!("skipping a synced transaction: {}", error);
                    }
                }
            }
            Payload::NewBlock(block) => {
                if self.receive_block(source, block.clone(), true) {
                    self.broadcast(Payload::NewBlock(block), Some(source)).await;
                }
            }
            Payload::NewTransaction(transaction) => {
                let accepted = {
                    let ledger = self.ledger.read();
                    self.memory_pool.lock().insert(&ledger, transaction.clone())
                };
                match accepted {
                    Ok(()) => {
                        self.broadcast(Payload::NewTransaction(transaction), Some(source)).await;
                    }
                    Err(error) => debug!("rejected a transaction from {}: {}", source, error),
                }
            }
            Payload::PeerList(addresses) => {
                let mut peer_book = self.peer_book.write();
                for address in addresses {
                    peer_book.add_gossiped(address);
                }
            }
            Payload::AddPeer(address) => {
                let server = self.clone();
                tokio::spawn(async move {
                    if let Err(error) = server.connect(address).await {
                        debug!("failed to connect to gossiped peer {}: {}", address, error);
                    }
                });
            }
            Payload::RemovePeer(address) => {
                self.drop_peer(address);
            }
            Payload::MiningRequest {
                miner_address,
                max_attempts,
            } => {
                self.handle_mining_request(source, miner_address, max_attempts).await;
            }
            Payload::MiningResponse {
                accepted,
                height,
                block_hash,
            } => {
                debug!(
                    "{} reports a mining result: accepted={} height={} hash={}",
                    source, accepted, height, block_hash
                );
            }
            Payload::ConsensusRequest { .. } => {
                let (height, head_hash) = {
                    let ledger = self.ledger.read();
                    (ledger.height(), ledger.latest_block().hash.clone())
                };
                let _ = self.send(source, Payload::ConsensusResponse { height, head_hash }).await;
            }
            Payload::ConsensusResponse { height, head_hash } => {
                let ours = self.ledger.read().height();
                if height > ours {
                    debug!("{} is ahead at {} ({}), requesting blocks", source, height, head_hash);
                    let _ = self.send(source, Payload::GetBlocks { from: ours, to: height }).await;
                }
            }
        }
    }

    /// Validates and appends a block received from a peer. Returns whether
    /// the block extended the chain.
    fn receive_block(&self, source: SocketAddr, block: Block, noisy: bool) -> bool {
        match self
            .parameters
            .receive_block(&self.ledger, &self.memory_pool, &block)
        {
            Ok(height) => {
                info!("accepted block {} from {}", height - 1, source);
                (self.block_hook)(&block);
                true
            }
            Err(error) => {
                if noisy {
                    debug!("rejected a block from {}: {}", source, error);
                }
                if let Some(peer) = self.peer_book.read().get(&source) {
                    peer.quality.failures.fetch_add(1, Ordering::SeqCst);
                }
                false
            }
        }
    }

    /// Mines one block on a blocking worker in response to a peer request.
    async fn handle_mining_request(&self, source: SocketAddr, miner_address: String, max_attempts: u64) {
        let parameters = Arc::clone(&self.parameters);
        let ledger = Arc::clone(&self.ledger);
        let memory_pool = Arc::clone(&self.memory_pool);

        let mined = tokio::task::spawn_blocking(move || {
            let miner = Miner::new(miner_address, parameters);
            miner.mine_block(&ledger, &memory_pool, max_attempts)
        })
        .await;

        let response = match mined {
            Ok(Ok(block)) => {
                (self.block_hook)(&block);
                let payload = Payload::MiningResponse {
                    accepted: true,
                    height: block.index,
                    block_hash: block.hash.clone(),
                };
                self.broadcast(Payload::NewBlock(block), Some(source)).await;
                payload
            }
            Ok(Err(error)) => {
                debug!("a requested mine failed: {}", error);
                Payload::MiningResponse {
                    accepted: false,
                    height: self.ledger.read().height(),
                    block_hash: String::new(),
                }
            }
            Err(error) => {
                warn!("the mining worker panicked: {}", error);
                return;
            }
        };
        let _ = self.send(source, response).await;
    }
}
