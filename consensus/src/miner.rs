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

use crate::{BlockHook, ConsensusError, ConsensusParameters, MemoryPool};
use nilotic_objects::{Block, Transaction};
use nilotic_storage::Ledger;

use parking_lot::{Condvar, Mutex, RwLock};
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        mpsc,
        Arc,
    },
    thread,
    thread::JoinHandle,
    time::Duration,
};

/// Compiles pending transactions into blocks and searches the nonce space
/// for a proof-of-work solution.
///
/// Construction does not spawn anything; the background loop starts only on
/// an explicit `start` and is joined on `stop`.
#[derive(Clone)]
pub struct Miner {
    /// The coinbase address that mining rewards are assigned to.
    address: String,
    /// The consensus parameters for the network of this miner.
    pub parameters: Arc<ConsensusParameters>,
    /// Raised to interrupt the nonce search and the background loop.
    shutdown: Arc<AtomicBool>,
    /// Whether the background loop is currently running.
    is_mining: Arc<AtomicBool>,
    /// Wakes the background loop out of its error backoff on shutdown.
    pacing: Arc<(Mutex<bool>, Condvar)>,
    worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Miner {
    /// Creates a new instance of `Miner`.
    pub fn new(address: impl Into<String>, parameters: Arc<ConsensusParameters>) -> Self {
        Self {
            address: address.into(),
            parameters,
            shutdown: Arc::new(AtomicBool::new(false)),
            is_mining: Arc::new(AtomicBool::new(false)),
            pacing: Arc::new((Mutex::new(false), Condvar::new())),
            worker: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns the coinbase address of this miner.
    #[inline]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Assembles the next block from the chain head: a coinbase paying the
    /// height-adjusted reward plus the flat fees of every included
    /// transaction, followed by the candidates in FIFO order. Candidates
    /// that have become invalid or underfunded are skipped.
    pub fn establish_block(
        &self,
        ledger: &Ledger,
        candidates: Vec<Transaction>,
    ) -> Result<Block, ConsensusError> {
        let head = ledger.latest_block();
        let height = head.index + 1;
        let mut block = Block::new(height, head.hash.clone());

        let mut selected = Vec::with_capacity(candidates.len());
        let mut deltas: HashMap<String, f64> = HashMap::new();
        for tx in candidates {
            if !tx.is_valid() || ledger.contains_transaction(&tx.hash) {
                debug!("skipping a stale candidate {}", tx.hash);
                continue;
            }
            if !tx.is_coinbase() && !tx.is_contract_deployment() {
                let available =
                    ledger.balance_of(&tx.sender) + deltas.get(&tx.sender).copied().unwrap_or(0.0);
                if available < tx.amount {
                    debug!("skipping an underfunded candidate {}", tx.hash);
                    continue;
                }
                *deltas.entry(tx.sender.clone()).or_insert(0.0) -= tx.amount;
                *deltas.entry(tx.recipient.clone()).or_insert(0.0) += tx.amount;
            }
            selected.push(tx);
        }

        let fees = selected.len() as f64 * ledger.transaction_fee;
        let reward = self.parameters.block_reward(ledger.mining_reward, height) + fees;
        block.add_transaction(Transaction::coinbase(self.address.as_str(), reward))?;
        for tx in selected {
            block.add_transaction(tx)?;
        }
        block.seal();
        Ok(block)
    }

    /// Searches for a nonce satisfying `difficulty`, partitioning the nonce
    /// space across the configured worker threads by stride. The first
    /// worker to find a valid hash wins and signals the others to stop.
    ///
    /// With `max_attempts > 0` the combined search gives up once that many
    /// hashes have been tried.
    pub fn find_nonce(
        &self,
        block: &mut Block,
        difficulty: u32,
        max_attempts: u64,
    ) -> Result<(), ConsensusError> {
        block.merkle_root = block.compute_merkle_root();

        let workers = self.parameters.mining_threads.max(1);
        let stop = Arc::new(AtomicBool::new(false));
        let attempts = Arc::new(AtomicU64::new(0));
        let (solution_sender, solutions) = mpsc::channel();

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let mut candidate = block.clone();
            let stop = Arc::clone(&stop);
            let shutdown = Arc::clone(&self.shutdown);
            let attempts = Arc::clone(&attempts);
            let solution_sender = solution_sender.clone();
            let stride = workers as u64;

            let handle = thread::Builder::new()
                .name(format!("miner-worker-{}", worker))
                .spawn(move || {
                    let mut nonce = worker as u64;
                    loop {
                        if stop.load(Ordering::Relaxed) || shutdown.load(Ordering::Relaxed) {
                            return;
                        }
                        if max_attempts > 0
                            && attempts.fetch_add(1, Ordering::Relaxed) >= max_attempts
                        {
                            stop.store(true, Ordering::Relaxed);
                            return;
                        }
                        candidate.nonce = nonce;
                        candidate.hash = candidate.compute_hash();
                        if candidate.meets_difficulty(difficulty) {
                            stop.store(true, Ordering::Relaxed);
                            let _ = solution_sender.send((nonce, candidate.hash.clone()));
                            return;
                        }
                        nonce += stride;
                    }
                })
                .expect("could not spawn a mining worker");
            handles.push(handle);
        }
        drop(solution_sender);

        for handle in handles {
            let _ = handle.join();
        }

        match solutions.try_recv() {
            Ok((nonce, hash)) => {
                block.nonce = nonce;
                block.hash = hash;
                Ok(())
            }
            Err(_) if self.shutdown.load(Ordering::Relaxed) => Err(ConsensusError::Interrupted),
            Err(_) => Err(ConsensusError::NonceSearchFailed(max_attempts)),
        }
    }

    /// Produces and appends one block synchronously.
    ///
    /// Only one block is appended per successful mine even under concurrent
    /// calls: the append runs under the ledger write lock and a losing
    /// racer fails the linkage check.
    pub fn mine_block(
        &self,
        ledger: &RwLock<Ledger>,
        memory_pool: &Mutex<MemoryPool>,
        max_attempts: u64,
    ) -> Result<Block, ConsensusError> {
        let (mut block, difficulty) = {
            let ledger = ledger.read();
            let candidates = memory_pool
                .lock()
                .candidates(self.parameters.max_transactions_per_block);
            (
                self.establish_block(&ledger, candidates)?,
                self.parameters.effective_difficulty(&ledger),
            )
        };

        debug!(
            "searching for a nonce at height {} (difficulty {})",
            block.index, difficulty
        );
        self.find_nonce(&mut block, difficulty, max_attempts)?;
        self.parameters.receive_block(ledger, memory_pool, &block)?;
        Ok(block)
    }

    /// Starts the background mining loop. Idempotent: a second call while
    /// mining is a no-op.
    pub fn start(
        &self,
        ledger: Arc<RwLock<Ledger>>,
        memory_pool: Arc<Mutex<MemoryPool>>,
        on_block: BlockHook,
    ) {
        if self.is_mining.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shutdown.store(false, Ordering::SeqCst);
        *self.pacing.0.lock() = false;

        let miner = self.clone();
        let handle = thread::Builder::new()
            .name("miner".to_owned())
            .spawn(move || {
                info!("mining started for {}", miner.address);
                while !miner.shutdown.load(Ordering::SeqCst) {
                    match miner.mine_block(&ledger, &memory_pool, 0) {
                        Ok(block) => on_block(&block),
                        Err(ConsensusError::Interrupted) => break,
                        Err(error) => {
                            debug!("a mining attempt failed: {}", error);
                            miner.backoff(Duration::from_millis(250));
                        }
                    }
                }
                info!("mining stopped");
            })
            .expect("could not spawn the mining loop");
        *self.worker.lock() = Some(handle);
    }

    /// Stops the background mining loop and joins it. Idempotent.
    pub fn stop(&self) {
        if !self.is_mining.swap(false, Ordering::SeqCst) {
            return;
        }
        self.shutdown.store(true, Ordering::SeqCst);
        {
            let (lock, condvar) = &*self.pacing;
            let mut stopping = lock.lock();
            *stopping = true;
            condvar.notify_all();
        }
        if let Some(handle) = self.worker.lock().take() {
            let _ = handle.join();
        }
    }

    /// Returns whether the background loop is running.
    #[inline]
    pub fn is_mining(&self) -> bool {
        self.is_mining.load(Ordering::SeqCst)
    }

    /// Sleeps for `timeout` unless shutdown is signalled first.
    fn backoff(&self, timeout: Duration) {
        let (lock, condvar) = &*self.pacing;
        let mut stopping = lock.lock();
        if !*stopping {
            condvar.wait_for(&mut stopping, timeout);
        }
    }
}
