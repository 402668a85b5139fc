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

use crate::Config;
use nilotic_consensus::{
    pos,
    BlockHook,
    ConsensusError,
    ConsensusParameters,
    MemoryPool,
    Miner,
};
use nilotic_metrics::Metrics;
use nilotic_network::{NetworkError, Payload, Server, ServerConfig};
use nilotic_objects::{Block, Transaction};
use nilotic_porc::{Contribution, PorcEngine, PorcError, PorcStatsSnapshot, PorcStore, WalletStatus};
use nilotic_storage::{Ledger, Snapshot, StorageError};

use parking_lot::{Condvar, Mutex, RwLock};
use serde::Serialize;
use std::{
    net::SocketAddr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
    thread::JoinHandle,
    time::Duration,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Consensus(#[from] ConsensusError),

    #[error(transparent)]
    Network(#[from] NetworkError),

    #[error(transparent)]
    Porc(#[from] PorcError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("could not parse the config file: {0}")]
    Config(#[from] toml::de::Error),
}

/// The node summary reported to operators.
#[derive(Debug, Clone, Serialize)]
pub struct NodeInfo {
    pub chain_height: u32,
    pub difficulty: u32,
    pub mining_reward: f64,
    pub pending_transactions: usize,
    pub version: String,
}

/// Builds the callback fanning accepted blocks out to the contribution
/// engine and the metrics counters.
fn block_fanout(
    metrics: Arc<Metrics>,
    porc: Arc<PorcEngine>,
    ledger: Arc<RwLock<Ledger>>,
) -> BlockHook {
    Arc::new(move |block: &Block| {
        metrics.blocks_accepted.fetch_add(1, Ordering::Relaxed);
        porc.on_block_appended(&ledger, block);
    })
}

/// The node orchestrator: exclusive owner of the ledger, the mining
/// engine, and the contribution engine.
///
/// Construction wires the subsystems together without starting anything;
/// `start` activates them and `stop` shuts them down in reverse order and
/// writes the final snapshot.
pub struct Node {
    config: Config,
    parameters: Arc<ConsensusParameters>,
    ledger: Arc<RwLock<Ledger>>,
    memory_pool: Arc<Mutex<MemoryPool>>,
    miner: Miner,
    porc: Arc<PorcEngine>,
    metrics: Arc<Metrics>,
    server: Server,
    /// Wakes the audit and metrics threads out of their interval sleeps.
    pacing: Arc<(Mutex<bool>, Condvar)>,
    started: AtomicBool,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl Node {
    /// Creates a node from the given configuration, restoring persisted
    /// state when present. A corrupt snapshot refuses to start the node
    /// rather than silently resetting the chain.
    pub fn new(config: Config) -> Result<Self, NodeError> {
        let snapshot_path = config.snapshot_path();
        let (ledger, pending) = if snapshot_path.exists() {
            let snapshot = Snapshot::load(&snapshot_path)?;
            info!(
                "restored {} blocks and {} pending transactions from {}",
                snapshot.blocks.len(),
                snapshot.pending.len(),
                snapshot_path.display()
            );
            snapshot.restore()
        } else {
            info!("no snapshot at {}; starting a fresh chain", snapshot_path.display());
            (Ledger::new(), vec![])
        };

        let ledger = Arc::new(RwLock::new(ledger));
        let mut memory_pool = MemoryPool::new();
        memory_pool.restore(pending);
        let memory_pool = Arc::new(Mutex::new(memory_pool));

        let parameters = Arc::new(config.consensus.clone());
        let miner_address = if config.miner_address.is_empty() {
            config.node_id.clone()
        } else {
            config.miner_address.clone()
        };
        let miner = Miner::new(miner_address, Arc::clone(&parameters));

        let porc = Arc::new(PorcEngine::new(Some(PorcStore::new(config.porc_dir())))?);
        let metrics = Arc::new(Metrics::new());

        let server = Server::new(
            ServerConfig {
                node_id: config.node_id.clone(),
                listen_address: config.listen_address(),
                max_peers: config.max_peers,
                handshake_timeout_secs: config.handshake_timeout_secs,
                ping_interval_secs: config.ping_interval_secs,
            },
            Arc::clone(&parameters),
            Arc::clone(&ledger),
            Arc::clone(&memory_pool),
            block_fanout(Arc::clone(&metrics), Arc::clone(&porc), Arc::clone(&ledger)),
        );

        Ok(Self {
            config,
            parameters,
            ledger,
            memory_pool,
            miner,
            porc,
            metrics,
            server,
            pacing: Arc::new((Mutex::new(false), Condvar::new())),
            started: AtomicBool::new(false),
            background: Mutex::new(vec![]),
        })
    }

    /// The callback applied to every locally accepted block.
    fn block_hook(&self) -> BlockHook {
        block_fanout(
            Arc::clone(&self.metrics),
            Arc::clone(&self.porc),
            Arc::clone(&self.ledger),
        )
    }

    /// Like `block_hook`, but also announces the block to peers. Used by
    /// the background mining loop, which runs off the async runtime.
    fn broadcasting_hook(&self) -> BlockHook {
        let inner = self.block_hook();
        let server = self.server.clone();
        let runtime = tokio::runtime::Handle::current();
        Arc::new(move |block: &Block| {
            inner(block);
            let server = server.clone();
            let block = block.clone();
            runtime.spawn(async move {
                server.broadcast(Payload::NewBlock(block), None).await;
            });
        })
    }

    /// Starts the network stack, the contribution engine, the optional
    /// mining loop, and the audit and metrics threads. Idempotent.
    pub async fn start(&self) -> Result<(), NodeError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        *self.pacing.0.lock() = false;

        let listen_address = self.server.start().await?;
        self.porc.start(Arc::clone(&self.ledger));
        if self.config.mine {
            self.miner.start(
                Arc::clone(&self.ledger),
                Arc::clone(&self.memory_pool),
                self.broadcasting_hook(),
            );
        }
        self.spawn_audit_thread();
        self.spawn_metrics_thread();

        info!(
            "node {} is up on {} (mining: {})",
            self.config.node_id, listen_address, self.config.mine
        );
        Ok(())
    }

    /// Stops every subsystem, joins the background threads, and writes the
    /// final snapshot. Idempotent.
    pub async fn stop(&self) {
        if !self.started.swap(false, Ordering::SeqCst) {
            return;
        }

        self.miner.stop();
        self.porc.stop();
        self.server.stop().await;

        {
            let (lock, condvar) = &*self.pacing;
            let mut stopping = lock.lock();
            *stopping = true;
            condvar.notify_all();
        }
        for handle in self.background.lock().drain(..) {
            let _ = handle.join();
        }

        if let Err(error) = self.save_snapshot() {
            error!("failed to write the shutdown snapshot: {}", error);
        }
        info!("node stopped cleanly");
    }

    /// Writes the chain, balances, and pending queue to the data dir.
    /// Callable at any operator-chosen point, not just shutdown.
    pub fn save_snapshot(&self) -> Result<(), NodeError> {
        let pending = self.memory_pool.lock().transactions();
        let ledger = self.ledger.read();
        Snapshot::capture(&ledger, pending).save(&self.config.snapshot_path())?;
        Ok(())
    }

    /// Periodically re-validates the chain; a broken link discards the
    /// tail. This simple recovery is unsafe against adversarial peers.
    fn spawn_audit_thread(&self) {
        let ledger = Arc::clone(&self.ledger);
        let pacing = Arc::clone(&self.pacing);
        let interval = Duration::from_secs(self.config.audit_interval_secs);

        let handle = thread::Builder::new()
            .name("chain-audit".to_owned())
            .spawn(move || loop {
                {
                    let (lock, condvar) = &*pacing;
                    let mut stopping = lock.lock();
                    if !*stopping {
                        condvar.wait_for(&mut stopping, interval);
                    }
                    if *stopping {
                        break;
                    }
                }
                if let Some(index) = ledger.read().validate_chain() {
                    warn!("chain audit found a broken link at block {}; discarding the tail", index);
                    ledger.write().truncate_to(index);
                }
            })
            .expect("could not spawn the chain audit thread");
        self.background.lock().push(handle);
    }

    /// Samples and logs the node counters on a fixed interval.
    fn spawn_metrics_thread(&self) {
        let metrics = Arc::clone(&self.metrics);
        let server = self.server.clone();
        let pacing = Arc::clone(&self.pacing);
        let interval = Duration::from_secs(self.config.metrics_interval_secs);

        let handle = thread::Builder::new()
            .name("metrics".to_owned())
            .spawn(move || loop {
                {
                    let (lock, condvar) = &*pacing;
                    let mut stopping = lock.lock();
                    if !*stopping {
                        condvar.wait_for(&mut stopping, interval);
                    }
                    if *stopping {
                        break;
                    }
                }
                let peers = server.peer_book().read().connected_count() as u64;
                let (sent, received) = server.message_counts();
                metrics.peers_connected.store(peers, Ordering::Relaxed);
                metrics.messages_sent.store(sent, Ordering::Relaxed);
                metrics.messages_received.store(received, Ordering::Relaxed);
                metrics.report();
            })
            .expect("could not spawn the metrics thread");
        self.background.lock().push(handle);
    }

    /// Returns the operator summary.
    pub fn node_info(&self) -> NodeInfo {
        let ledger = self.ledger.read();
        NodeInfo {
            chain_height: ledger.height(),
            difficulty: ledger.difficulty,
            mining_reward: ledger.mining_reward,
            pending_transactions: self.memory_pool.lock().len(),
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    /// Creates, signs, pools, and announces a transfer.
    pub async fn submit_transaction(
        &self,
        sender: &str,
        recipient: &str,
        amount: f64,
    ) -> Result<Transaction, NodeError> {
        let mut transaction = Transaction::new(sender, recipient, amount);
        transaction.sign(&format!("{}-key", sender));

        let pooled = {
            let ledger = self.ledger.read();
            self.memory_pool.lock().insert(&ledger, transaction.clone())
        };
        match pooled {
            Ok(()) => {
                self.metrics.transactions_accepted.fetch_add(1, Ordering::Relaxed);
                self.server
                    .broadcast(Payload::NewTransaction(transaction.clone()), None)
                    .await;
                Ok(transaction)
            }
            Err(error) => {
                self.metrics.transactions_rejected.fetch_add(1, Ordering::Relaxed);
                Err(error.into())
            }
        }
    }

    /// Mines one block synchronously on a blocking worker and announces it.
    pub async fn mine_once(
        &self,
        miner_address: Option<String>,
        max_attempts: u64,
    ) -> Result<Block, NodeError> {
        let miner = match miner_address {
            Some(address) => Miner::new(address, Arc::clone(&self.parameters)),
            None => self.miner.clone(),
        };
        let ledger = Arc::clone(&self.ledger);
        let memory_pool = Arc::clone(&self.memory_pool);

        let mined = tokio::task::spawn_blocking(move || {
            miner.mine_block(&ledger, &memory_pool, max_attempts)
        })
        .await
        .map_err(|error| {
            NodeError::Io(std::io::Error::new(std::io::ErrorKind::Other, error.to_string()))
        })?;
        let block = match mined {
            Ok(block) => block,
            Err(error) => {
                self.metrics.blocks_rejected.fetch_add(1, Ordering::Relaxed);
                return Err(error.into());
            }
        };

        (self.block_hook())(&block);
        self.server
            .broadcast(Payload::NewBlock(block.clone()), None)
            .await;
        Ok(block)
    }

    /// Assembles and attests the next block on the proof-of-stake path.
    pub async fn forge_block_pos(
        &self,
        validator: &str,
        signature: &str,
    ) -> Result<Block, NodeError> {
        let candidates = self
            .memory_pool
            .lock()
            .candidates(self.parameters.max_transactions_per_block);
        let mut block = {
            let ledger = self.ledger.read();
            let head = ledger.latest_block();
            Block::new(head.index + 1, head.hash.clone())
        };
        for transaction in candidates {
            block.add_transaction(transaction).map_err(ConsensusError::from)?;
        }

        let block = pos::validate_block_pos(
            &self.parameters,
            &self.ledger,
            &self.memory_pool,
            block,
            validator,
            signature,
        )?;

        (self.block_hook())(&block);
        self.server
            .broadcast(Payload::NewBlock(block.clone()), None)
            .await;
        Ok(block)
    }

    /// Locks balance as validator stake.
    pub fn stake(&self, address: &str, amount: f64) -> Result<(), NodeError> {
        Ok(self.ledger.write().stake(address, amount)?)
    }

    /// Releases validator stake back into the balance.
    pub fn unstake(&self, address: &str, amount: f64) -> Result<(), NodeError> {
        Ok(self.ledger.write().unstake(address, amount)?)
    }

    /// The validator the deterministic selection policy would pick next.
    pub fn select_validator(&self) -> Option<String> {
        pos::select_validator(&self.ledger.read())
    }

    /// Enrolls a wallet for contribution rewards.
    pub fn enable_porc(&self, address: &str, bandwidth_limit: f64) -> Result<WalletStatus, NodeError> {
        Ok(self.porc.enable_wallet(&self.ledger, address, bandwidth_limit)?)
    }

    /// Verifies and applies a submitted contribution log entry.
    pub fn submit_porc_log(&self, contribution: Contribution) -> Result<f64, NodeError> {
        let points = self.porc.submit_contribution(contribution)?;
        self.metrics.contributions_verified.fetch_add(1, Ordering::Relaxed);
        Ok(points)
    }

    /// Contribution status for a single wallet.
    pub fn porc_wallet(&self, address: &str) -> Option<WalletStatus> {
        self.porc.wallet_status(address)
    }

    /// Contribution engine counters.
    pub fn porc_stats(&self) -> PorcStatsSnapshot {
        self.porc.stats()
    }

    /// The current contribution pools.
    pub fn porc_pools(&self) -> Vec<nilotic_porc::Pool> {
        self.porc.pools()
    }

    /// Dials a remote peer.
    pub async fn connect(&self, address: SocketAddr) -> Result<(), NodeError> {
        Ok(self.server.connect(address).await?)
    }

    /// The balance of an address, defaulting to zero.
    pub fn balance_of(&self, address: &str) -> f64 {
        self.ledger.read().balance_of(address)
    }

    /// A clone of the chain, genesis first.
    pub fn chain(&self) -> Vec<Block> {
        self.ledger.read().chain().to_vec()
    }

    /// Shared access to the ledger for embedding surfaces.
    pub fn ledger(&self) -> &Arc<RwLock<Ledger>> {
        &self.ledger
    }

    /// Shared access to the metrics counters.
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}
