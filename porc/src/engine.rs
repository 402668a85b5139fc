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
    pool::partition,
    store::PorcState,
    Contribution,
    Pool,
    PorcError,
    PorcStore,
    Task,
    TaskKind,
    WalletStatus,
    ACTIVITY_WINDOW_SECS,
    BLOCKS_PER_DAY,
    BURN_RATE,
    DAILY_REWARD_POOL,
    EARLY_ADOPTER_LIMIT,
    EARLY_ADOPTER_MULTIPLIER,
    MAX_REWARD_PER_BLOCK,
    MIN_ACTIVITY,
    MIN_BALANCE,
    POOL_ROTATION_BLOCKS,
};
use nilotic_objects::{timestamp_now, Block, Transaction};
use nilotic_storage::Ledger;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering},
        mpsc,
        Arc,
    },
    thread,
    thread::JoinHandle,
};

const SECONDS_PER_DAY: i64 = 86_400;

/// Engine counters; read through `PorcEngine::stats`.
#[derive(Debug, Default)]
pub struct PorcStats {
    pub contributions_accepted: AtomicU64,
    pub contributions_rejected: AtomicU64,
    pub tasks_generated: AtomicU64,
    pub rewards_minted: Mutex<f64>,
    pub fees_burned: Mutex<f64>,
}

/// A point-in-time view of the engine for operators.
#[derive(Debug, Clone, Serialize)]
pub struct PorcStatsSnapshot {
    pub enrolled_wallets: usize,
    pub early_adopters: usize,
    pub pools: usize,
    pub pending_tasks: usize,
    pub contributions_accepted: u64,
    pub contributions_rejected: u64,
    pub tasks_generated: u64,
    pub rewards_minted: f64,
    pub fees_burned: f64,
    pub last_height: u32,
}

/// The proof-of-resource-contribution engine.
///
/// Construction does not spawn anything. When started, three staged worker
/// threads consume accepted blocks in order: reward distribution, pool
/// rotation, task assignment. Without `start` the same pipeline runs
/// synchronously inside `on_block_appended`.
///
/// Lock order within the engine is wallets, then pools, then tasks; the
/// ledger lock is never held across an engine table lock acquisition.
pub struct PorcEngine {
    wallets: RwLock<HashMap<String, WalletStatus>>,
    pools: RwLock<Vec<Pool>>,
    tasks: RwLock<HashMap<String, Task>>,
    /// Megabytes relayed per wallet per day, keyed by `(wallet, day)`.
    daily_usage: Mutex<HashMap<(String, i64), f64>>,
    stats: PorcStats,
    /// Lifetime enrollments; the first `EARLY_ADOPTER_LIMIT` get the bonus.
    enrollments: AtomicUsize,
    early_adopters: AtomicUsize,
    last_height: AtomicU32,
    store: Option<PorcStore>,
    running: AtomicBool,
    block_feed: Mutex<Option<mpsc::Sender<Block>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl PorcEngine {
    /// Creates an engine, restoring durable state when a store is given.
    pub fn new(store: Option<PorcStore>) -> Result<Self, PorcError> {
        let engine = Self {
            wallets: RwLock::new(HashMap::new()),
            pools: RwLock::new(vec![]),
            tasks: RwLock::new(HashMap::new()),
            daily_usage: Mutex::new(HashMap::new()),
            stats: PorcStats::default(),
            enrollments: AtomicUsize::new(0),
            early_adopters: AtomicUsize::new(0),
            last_height: AtomicU32::new(0),
            store,
            running: AtomicBool::new(false),
            block_feed: Mutex::new(None),
            workers: Mutex::new(vec![]),
        };

        if let Some(store) = &engine.store {
            if let Some(state) = store.load_state()? {
                let early = state.wallets.values().filter(|w| w.is_early_adopter).count();
                engine.enrollments.store(state.enrollments, Ordering::SeqCst);
                engine.early_adopters.store(early, Ordering::SeqCst);
                info!(
                    "restored {} enrolled wallets and {} pools",
                    state.wallets.len(),
                    state.pools.len()
                );
                *engine.wallets.write() = state.wallets;
                *engine.pools.write() = state.pools;
                *engine.tasks.write() = state.tasks;
            }
        }

        Ok(engine)
    }

    /// Enrolls a wallet for contribution rewards.
    ///
    /// The wallet must hold the minimum balance and show recent activity on
    /// the chain. Enrollment is idempotent; re-enabling updates the declared
    /// bandwidth limit but never re-grants early-adopter status. Newly
    /// enrolled wallets join the currently active pool when it has capacity,
    /// or open a new one for the remainder of the window.
    pub fn enable_wallet(
        &self,
        ledger: &RwLock<Ledger>,
        address: &str,
        bandwidth_limit_mb_per_day: f64,
    ) -> Result<WalletStatus, PorcError> {
        // The eligibility reads release the ledger lock before any engine
        // table lock is taken.
        let (balance, activity) = {
            let ledger = ledger.read();
            (
                ledger.balance_of(address),
                ledger.activity_of(address, timestamp_now() - ACTIVITY_WINDOW_SECS),
            )
        };
        if balance < MIN_BALANCE {
            return Err(PorcError::Ineligible {
                address: address.to_owned(),
                reason: format!("balance {} is below the minimum {}", balance, MIN_BALANCE),
            });
        }
        if activity < MIN_ACTIVITY {
            return Err(PorcError::Ineligible {
                address: address.to_owned(),
                reason: format!(
                    "{} recent transactions, {} required",
                    activity, MIN_ACTIVITY
                ),
            });
        }

        let mut wallets = self.wallets.write();
        if let Some(existing) = wallets.get_mut(address) {
            existing.enabled = true;
            existing.bandwidth_limit_mb_per_day = bandwidth_limit_mb_per_day;
            return Ok(existing.clone());
        }

        let enrollment = self.enrollments.fetch_add(1, Ordering::SeqCst);
        let is_early_adopter = enrollment < EARLY_ADOPTER_LIMIT;
        if is_early_adopter {
            self.early_adopters.fetch_add(1, Ordering::SeqCst);
        }
        let mut status = WalletStatus::new(address, bandwidth_limit_mb_per_day, is_early_adopter);

        let height = self.last_height.load(Ordering::SeqCst);
        let mut pools = self.pools.write();
        match pools.iter_mut().find(|p| p.is_active(height) && p.has_capacity()) {
            Some(pool) => {
                pool.members.insert(address.to_owned());
                status.pool_index = Some(pool.index);
            }
            None => {
                let index = pools.len();
                let mut pool = Pool::new(index, height - height % POOL_ROTATION_BLOCKS);
                pool.members.insert(address.to_owned());
                status.pool_index = Some(index);
                pools.push(pool);
            }
        }
        drop(pools);

        info!(
            "enrolled {} (early adopter: {}, bandwidth {} MB/day)",
            address, is_early_adopter, bandwidth_limit_mb_per_day
        );
        wallets.insert(address.to_owned(), status.clone());
        Ok(status)
    }

    /// Withdraws a wallet from task assignment without losing its totals.
    pub fn disable_wallet(&self, address: &str) -> Result<(), PorcError> {
        let mut wallets = self.wallets.write();
        let status = wallets
            .get_mut(address)
            .ok_or_else(|| PorcError::WalletNotEnrolled(address.to_owned()))?;
        status.enabled = false;
        Ok(())
    }

    /// Verifies and applies a contribution proof, returning the resource
    /// points granted.
    pub fn submit_contribution(&self, contribution: Contribution) -> Result<f64, PorcError> {
        match self.verify_and_apply(contribution) {
            Ok(points) => {
                self.stats.contributions_accepted.fetch_add(1, Ordering::SeqCst);
                Ok(points)
            }
            Err(error) => {
                self.stats.contributions_rejected.fetch_add(1, Ordering::SeqCst);
                Err(error)
            }
        }
    }

    fn verify_and_apply(&self, contribution: Contribution) -> Result<f64, PorcError> {
        let task = self
            .tasks
            .read()
            .get(&contribution.task_id)
            .cloned()
            .ok_or_else(|| PorcError::UnknownTask(contribution.task_id.clone()))?;
        if task.assigned_wallet != contribution.wallet_address {
            return Err(PorcError::TaskNotAssigned {
                task_id: contribution.task_id.clone(),
                wallet: contribution.wallet_address.clone(),
            });
        }

        if contribution.proof_hash != contribution.expected_proof() {
            return Err(PorcError::ProofInvalid(
                "the proof hash does not match the canonical fields".to_owned(),
            ));
        }
        if contribution.signature.is_empty() {
            return Err(PorcError::ProofInvalid("the signature is empty".to_owned()));
        }

        let points = contribution.resource_points();
        let pool_index;
        {
            let mut wallets = self.wallets.write();
            let status = wallets
                .get_mut(&contribution.wallet_address)
                .ok_or_else(|| PorcError::WalletNotEnrolled(contribution.wallet_address.clone()))?;
            if !status.enabled {
                return Err(PorcError::WalletNotEnrolled(contribution.wallet_address.clone()));
            }

            let day = contribution.timestamp / SECONDS_PER_DAY;
            let mut usage = self.daily_usage.lock();
            let used = usage
                .entry((contribution.wallet_address.clone(), day))
                .or_insert(0.0);
            if *used + contribution.bandwidth_used_mb > status.bandwidth_limit_mb_per_day {
                return Err(PorcError::ProofInvalid(format!(
                    "daily bandwidth cap exceeded: {} + {} > {}",
                    used, contribution.bandwidth_used_mb, status.bandwidth_limit_mb_per_day
                )));
            }
            *used += contribution.bandwidth_used_mb;
            drop(usage);

            status.total_resource_points += points;
            status.last_contribution_ts = contribution.timestamp;
            status.reputation_score += 1.0;
            pool_index = status.pool_index;
        }

        if let Some(index) = pool_index {
            if let Some(pool) = self.pools.write().get_mut(index) {
                pool.add_points(&contribution.wallet_address, points);
            }
        }

        // The acknowledged task is consumed; replays fail the lookup.
        self.tasks.write().remove(&contribution.task_id);

        if let Some(store) = &self.store {
            store.append_contribution(&contribution)?;
        }

        debug!(
            "accepted a contribution from {} for {} ({} points)",
            contribution.wallet_address, contribution.task_id, points
        );
        Ok(points)
    }

    /// Feeds an accepted block through the engine: reward distribution,
    /// pool rotation on window boundaries, then task assignment. Called by
    /// the node's block hook; runs inline unless the engine was started.
    pub fn on_block_appended(&self, ledger: &Arc<RwLock<Ledger>>, block: &Block) {
        let feed = self.block_feed.lock().clone();
        match feed {
            Some(feed) => {
                if feed.send(block.clone()).is_err() {
                    warn!("the contribution pipeline is gone; processing inline");
                    self.process_block(ledger, block);
                }
            }
            None => self.process_block(ledger, block),
        }
    }

    /// The synchronous block pipeline.
    pub fn process_block(&self, ledger: &Arc<RwLock<Ledger>>, block: &Block) {
        self.last_height.store(block.index, Ordering::SeqCst);
        self.distribute_rewards(ledger, block.index);
        self.burn_fees(ledger, block);
        if block.index % POOL_ROTATION_BLOCKS == 0 {
            self.rotate_pools(block.index);
        }
        self.assign_tasks(block);
        self.persist_best_effort();
    }

    /// Splits the per-block reward budget across the active pool by
    /// accumulated points, applies the early-adopter multiplier, clamps to
    /// the per-wallet cap, and mints the result as coinbase transactions.
    fn distribute_rewards(&self, ledger: &Arc<RwLock<Ledger>>, height: u32) {
        let block_pool = DAILY_REWARD_POOL / BLOCKS_PER_DAY as f64;
        // The window that just completed: pools rotated out at this exact
        // height still pay for the points gathered during their window.
        let payable_height = height.saturating_sub(1);

        let mut mints: Vec<(String, f64)> = vec![];
        {
            let wallets = self.wallets.read();
            let mut pools = self.pools.write();
            for pool in pools.iter_mut().filter(|p| p.is_active(payable_height)) {
                let total = pool.total_points();
                if total <= 0.0 {
                    continue;
                }
                for (wallet, points) in &pool.points {
                    if *points <= 0.0 {
                        continue;
                    }
                    let mut reward = points / total * block_pool;
                    if wallets.get(wallet).map_or(false, |w| w.is_early_adopter) {
                        reward *= EARLY_ADOPTER_MULTIPLIER;
                    }
                    reward = reward.min(MAX_REWARD_PER_BLOCK);
                    if reward > 0.0 {
                        mints.push((wallet.clone(), reward));
                    }
                }
                pool.reset_points();
            }
        }

        for (wallet, reward) in mints {
            let mint = Transaction::coinbase(wallet.as_str(), reward);
            let mut ledger = ledger.write();
            let minted = ledger.apply_mint(&mint);
            drop(ledger);

            match minted {
                Ok(()) => {
                    if let Some(status) = self.wallets.write().get_mut(&wallet) {
                        status.total_rewards += reward;
                    }
                    *self.stats.rewards_minted.lock() += reward;
                    debug!("minted {} NIL to {} at height {}", reward, wallet, height);
                }
                Err(error) => warn!("failed to mint a contribution reward: {}", error),
            }
        }
    }

    /// Burns half of the block's transaction fees out of the fee
    /// recipient's coinbase credit.
    fn burn_fees(&self, ledger: &Arc<RwLock<Ledger>>, block: &Block) {
        let fee_recipient = match block.transactions.first() {
            Some(tx) if tx.is_coinbase() => tx.recipient.clone(),
            _ => return,
        };
        let fee_count = block.transactions.iter().filter(|tx| !tx.is_coinbase()).count();
        if fee_count == 0 {
            return;
        }

        let mut ledger = ledger.write();
        let fees = fee_count as f64 * ledger.transaction_fee;
        let burned = ledger.burn_from(&fee_recipient, BURN_RATE * fees);
        drop(ledger);

        if burned > 0.0 {
            *self.stats.fees_burned.lock() += burned;
            debug!("burned {} NIL of fees at height {}", burned, block.index);
        }
    }

    /// Repartitions every enabled wallet into fresh pools whose window
    /// starts at the given height.
    fn rotate_pools(&self, height: u32) {
        let mut wallets = self.wallets.write();
        let eligible: BTreeSet<String> = wallets
            .values()
            .filter(|status| status.enabled)
            .map(|status| status.address.clone())
            .collect();

        let new_pools = partition(&eligible, height);
        for status in wallets.values_mut() {
            status.pool_index = None;
        }
        for pool in &new_pools {
            for member in &pool.members {
                if let Some(status) = wallets.get_mut(member) {
                    status.pool_index = Some(pool.index);
                }
            }
        }

        info!(
            "rotated {} wallets into {} pools at height {}",
            eligible.len(),
            new_pools.len(),
            height
        );
        *self.pools.write() = new_pools;
    }

    /// Enqueues one task of each kind for every active pool member and
    /// drops assignments that went stale without an acknowledgement.
    fn assign_tasks(&self, block: &Block) {
        let height = block.index;
        let transaction_hashes: Vec<String> =
            block.transactions.iter().map(|tx| tx.hash.clone()).collect();

        let pools = self.pools.read();
        let mut tasks = self.tasks.write();
        tasks.retain(|_, task| task.block_height + POOL_ROTATION_BLOCKS > height);

        let mut generated = 0u64;
        for pool in pools.iter().filter(|p| p.is_active(height)) {
            for wallet in &pool.members {
                let kinds = [
                    TaskKind::RelayTransactions {
                        transaction_hashes: transaction_hashes.clone(),
                    },
                    TaskKind::PropagateBlock {
                        block_hash: block.hash.clone(),
                        block_height: height,
                    },
                    TaskKind::CacheData {
                        block_hashes: vec![block.previous_hash.clone(), block.hash.clone()],
                    },
                    TaskKind::VerifyPeers { sample_size: 8 },
                ];
                for kind in kinds.iter() {
                    let task = Task::new(kind.clone(), wallet.as_str(), height);
                    tasks.insert(task.task_id.clone(), task);
                    generated += 1;
                }
            }
        }

        if generated > 0 {
            self.stats.tasks_generated.fetch_add(generated, Ordering::SeqCst);
            trace!("assigned {} tasks at height {}", generated, height);
        }
    }

    /// Starts the staged block pipeline: rewards, rotation, assignment.
    /// Idempotent; `stop` drains and joins the three workers.
    pub fn start(self: &Arc<Self>, ledger: Arc<RwLock<Ledger>>) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let (feed, rewards_rx) = mpsc::channel::<Block>();
        let (rotation_tx, rotation_rx) = mpsc::channel::<Block>();
        let (assignment_tx, assignment_rx) = mpsc::channel::<Block>();
        *self.block_feed.lock() = Some(feed);

        let mut workers = self.workers.lock();

        let engine = Arc::clone(self);
        workers.push(
            thread::Builder::new()
                .name("porc-rewards".to_owned())
                .spawn(move || {
                    while let Ok(block) = rewards_rx.recv() {
                        engine.last_height.store(block.index, Ordering::SeqCst);
                        engine.distribute_rewards(&ledger, block.index);
                        engine.burn_fees(&ledger, &block);
                        if rotation_tx.send(block).is_err() {
                            break;
                        }
                    }
                })
                .expect("could not spawn the reward distribution thread"),
        );

        let engine = Arc::clone(self);
        workers.push(
            thread::Builder::new()
                .name("porc-rotation".to_owned())
                .spawn(move || {
                    while let Ok(block) = rotation_rx.recv() {
                        if block.index % POOL_ROTATION_BLOCKS == 0 {
                            engine.rotate_pools(block.index);
                        }
                        if assignment_tx.send(block).is_err() {
                            break;
                        }
                    }
                })
                .expect("could not spawn the pool rotation thread"),
        );

        let engine = Arc::clone(self);
        workers.push(
            thread::Builder::new()
                .name("porc-tasks".to_owned())
                .spawn(move || {
                    while let Ok(block) = assignment_rx.recv() {
                        engine.assign_tasks(&block);
                        engine.persist_best_effort();
                    }
                })
                .expect("could not spawn the task assignment thread"),
        );

        info!("contribution engine started");
    }

    /// Stops the pipeline and joins the workers. Idempotent.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        // Dropping the feed cascades a close through the three stages.
        *self.block_feed.lock() = None;
        for handle in self.workers.lock().drain(..) {
            let _ = handle.join();
        }
        self.persist_best_effort();
        info!("contribution engine stopped");
    }

    fn persist_best_effort(&self) {
        if let Some(store) = &self.store {
            let state = PorcState {
                wallets: self.wallets.read().clone(),
                pools: self.pools.read().clone(),
                tasks: self.tasks.read().clone(),
                enrollments: self.enrollments.load(Ordering::SeqCst),
            };
            if let Err(error) = store.save_state(&state) {
                warn!("failed to persist contribution state: {}", error);
            }
        }
    }

    /// Returns the status of an enrolled wallet.
    pub fn wallet_status(&self, address: &str) -> Option<WalletStatus> {
        self.wallets.read().get(address).cloned()
    }

    /// Returns the current pools.
    pub fn pools(&self) -> Vec<Pool> {
        self.pools.read().clone()
    }

    /// Returns the open tasks currently assigned to a wallet.
    pub fn tasks_for(&self, address: &str) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .read()
            .values()
            .filter(|task| task.assigned_wallet == address)
            .cloned()
            .collect();
        tasks.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        tasks
    }

    /// Returns a point-in-time view of the engine counters.
    pub fn stats(&self) -> PorcStatsSnapshot {
        PorcStatsSnapshot {
            enrolled_wallets: self.wallets.read().len(),
            early_adopters: self.early_adopters.load(Ordering::SeqCst),
            pools: self.pools.read().len(),
            pending_tasks: self.tasks.read().len(),
            contributions_accepted: self.stats.contributions_accepted.load(Ordering::SeqCst),
            contributions_rejected: self.stats.contributions_rejected.load(Ordering::SeqCst),
            tasks_generated: self.stats.tasks_generated.load(Ordering::SeqCst),
            rewards_minted: *self.stats.rewards_minted.lock(),
            fees_burned: *self.stats.fees_burned.lock(),
            last_height: self.last_height.load(Ordering::SeqCst),
        }
    }
}
