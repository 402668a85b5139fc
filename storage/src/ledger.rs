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

use crate::StorageError;
use nilotic_objects::{Block, Transaction};

use std::collections::{HashMap, HashSet};

/// The default count of leading zero hex characters required of a block hash.
pub const DEFAULT_DIFFICULTY: u32 = 4;

/// The default base reward paid to the miner of a block.
pub const DEFAULT_MINING_REWARD: f64 = 100.0;

/// The default flat fee collected per non-coinbase transaction.
pub const DEFAULT_TRANSACTION_FEE: f64 = 1.0;

/// Derives the registry address of a deployed contract from its transaction.
pub fn contract_address(tx_hash: &str) -> String {
    format!("CONTRACT-{}", &tx_hash[..10.min(tx_hash.len())])
}

/// The ledger state machine: the ordered chain plus the balance, stake, and
/// contract tables derived from it.
///
/// The ledger itself is not synchronized; the owning node wraps it in a
/// reader/writer lock and serializes every block append through it.
pub struct Ledger {
    chain: Vec<Block>,
    balances: HashMap<String, f64>,
    stakes: HashMap<String, f64>,
    contracts: HashMap<String, String>,
    applied: HashSet<String>,
    burned: f64,
    minted: f64,
    offline_transfers: u64,

    /// Leading zero hex characters required of a proof-of-work hash.
    pub difficulty: u32,
    /// Base block reward before halving.
    pub mining_reward: f64,
    /// Flat fee collected per non-coinbase transaction.
    pub transaction_fee: f64,
}

impl Ledger {
    /// Creates a ledger holding only the genesis block, with the genesis
    /// allocation already applied.
    pub fn new() -> Self {
        let mut ledger = Self {
            chain: vec![],
            balances: HashMap::new(),
            stakes: HashMap::new(),
            contracts: HashMap::new(),
            applied: HashSet::new(),
            burned: 0.0,
            minted: 0.0,
            offline_transfers: 0,
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            transaction_fee: DEFAULT_TRANSACTION_FEE,
        };

        let genesis = Block::genesis();
        for tx in &genesis.transactions {
            // Genesis carries only coinbase transactions; this cannot fail.
            if let Err(error) = ledger.apply_transaction(tx) {
                error!("failed to apply a genesis transaction: {}", error);
            }
        }
        ledger.chain.push(genesis);
        ledger
    }

    /// Rebuilds a ledger from restored state. Used by snapshot loading.
    pub(crate) fn from_parts(
        chain: Vec<Block>,
        balances: HashMap<String, f64>,
        stakes: HashMap<String, f64>,
        contracts: HashMap<String, String>,
        applied: HashSet<String>,
        burned: f64,
        minted: f64,
        offline_transfers: u64,
        difficulty: u32,
        mining_reward: f64,
        transaction_fee: f64,
    ) -> Self {
        Self {
            chain,
            balances,
            stakes,
            contracts,
            applied,
            burned,
            minted,
            offline_transfers,
            difficulty,
            mining_reward,
            transaction_fee,
        }
    }

    /// Returns the number of blocks in the chain.
    #[inline]
    pub fn height(&self) -> u32 {
        self.chain.len() as u32
    }

    /// Returns the most recently appended block.
    #[inline]
    pub fn latest_block(&self) -> &Block {
        self.chain.last().expect("the chain always contains genesis")
    }

    /// Returns the block at the given index, if present.
    #[inline]
    pub fn get_block(&self, index: u32) -> Option<&Block> {
        self.chain.get(index as usize)
    }

    /// Returns a view of the full chain, genesis first.
    #[inline]
    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    /// Returns the balance of an address, defaulting to zero.
    #[inline]
    pub fn balance_of(&self, address: &str) -> f64 {
        self.balances.get(address).copied().unwrap_or(0.0)
    }

    /// Returns the staked amount of an address, defaulting to zero.
    #[inline]
    pub fn stake_of(&self, address: &str) -> f64 {
        self.stakes.get(address).copied().unwrap_or(0.0)
    }

    /// Returns the balance table.
    #[inline]
    pub fn balances(&self) -> &HashMap<String, f64> {
        &self.balances
    }

    /// Returns the stake table; its keys are the registered validators.
    #[inline]
    pub fn stakes(&self) -> &HashMap<String, f64> {
        &self.stakes
    }

    /// Returns the code registered under a contract address.
    #[inline]
    pub fn contract_code(&self, address: &str) -> Option<&str> {
        self.contracts.get(address).map(String::as_str)
    }

    /// Returns the contract registry.
    #[inline]
    pub fn contracts(&self) -> &HashMap<String, String> {
        &self.contracts
    }

    /// Returns the set of applied transaction hashes.
    #[inline]
    pub fn applied_hashes(&self) -> &HashSet<String> {
        &self.applied
    }

    /// Returns the total amount removed from supply by fee burning.
    #[inline]
    pub fn burned(&self) -> f64 {
        self.burned
    }

    /// Returns the total amount minted outside of mined blocks.
    #[inline]
    pub fn minted(&self) -> f64 {
        self.minted
    }

    /// Returns the count of offline transfers flagged for redemption.
    #[inline]
    pub fn offline_transfers(&self) -> u64 {
        self.offline_transfers
    }

    /// Returns `true` when the transaction hash was already applied.
    #[inline]
    pub fn contains_transaction(&self, hash: &str) -> bool {
        self.applied.contains(hash)
    }

    /// Counts transactions touching `address` with a timestamp at or after
    /// `since`. Used for the contribution-eligibility activity gate.
    pub fn activity_of(&self, address: &str, since: i64) -> usize {
        self.chain
            .iter()
            .flat_map(|block| block.transactions.iter())
            .filter(|tx| tx.timestamp >= since && (tx.sender == address || tx.recipient == address))
            .count()
    }

    /// Appends a block, applying its transactions in array order.
    ///
    /// Linkage and proof checks belong to the consensus layer; this only
    /// enforces the structural chain invariants before mutating state.
    pub fn apply_block(&mut self, block: &Block) -> Result<(), StorageError> {
        let head = self.latest_block();
        if block.index != head.index + 1 {
            return Err(StorageError::NonSequentialBlock {
                expected: head.index + 1,
                got: block.index,
            });
        }
        if block.previous_hash != head.hash {
            return Err(StorageError::BrokenLink(block.index));
        }

        for tx in &block.transactions {
            self.apply_transaction(tx)?;
        }
        self.chain.push(block.clone());
        debug!("appended block {} ({} transactions)", block.index, block.transactions.len());
        Ok(())
    }

    fn apply_transaction(&mut self, tx: &Transaction) -> Result<(), StorageError> {
        if self.applied.contains(&tx.hash) {
            return Err(StorageError::DuplicateTransaction(tx.hash.clone()));
        }

        if tx.is_coinbase() {
            *self.balances.entry(tx.recipient.clone()).or_insert(0.0) += tx.amount;
        } else if tx.is_contract_deployment() {
            let address = contract_address(&tx.hash);
            let code = tx.contract_code.clone().unwrap_or_default();
            self.contracts.insert(address, code);
        } else {
            let available = self.balance_of(&tx.sender);
            if available < tx.amount {
                return Err(StorageError::InsufficientFunds {
                    address: tx.sender.clone(),
                    available,
                    required: tx.amount,
                });
            }
            *self.balances.entry(tx.sender.clone()).or_insert(0.0) -= tx.amount;
            *self.balances.entry(tx.recipient.clone()).or_insert(0.0) += tx.amount;
            if tx.is_offline {
                self.offline_transfers += 1;
            }
        }

        self.applied.insert(tx.hash.clone());
        Ok(())
    }

    /// Applies a coinbase mint outside of a mined block. Used for
    /// contribution rewards, which are issued at block boundaries rather
    /// than inside the block body.
    pub fn apply_mint(&mut self, tx: &Transaction) -> Result<(), StorageError> {
        debug_assert!(tx.is_coinbase());
        self.apply_transaction(tx)?;
        self.minted += tx.amount;
        Ok(())
    }

    /// Locks part of an address balance as validator stake.
    pub fn stake(&mut self, address: &str, amount: f64) -> Result<(), StorageError> {
        let available = self.balance_of(address);
        if available < amount {
            return Err(StorageError::InsufficientFunds {
                address: address.to_owned(),
                available,
                required: amount,
            });
        }
        *self.balances.entry(address.to_owned()).or_insert(0.0) -= amount;
        *self.stakes.entry(address.to_owned()).or_insert(0.0) += amount;
        Ok(())
    }

    /// Releases validator stake back into the address balance.
    pub fn unstake(&mut self, address: &str, amount: f64) -> Result<(), StorageError> {
        let staked = self.stake_of(address);
        if staked < amount {
            return Err(StorageError::InsufficientStake {
                address: address.to_owned(),
                available: staked,
                required: amount,
            });
        }
        *self.stakes.entry(address.to_owned()).or_insert(0.0) -= amount;
        *self.balances.entry(address.to_owned()).or_insert(0.0) += amount;
        if self.stake_of(address) == 0.0 {
            self.stakes.remove(address);
        }
        Ok(())
    }

    /// Removes burned fees from supply: debits the fee recipient's balance
    /// and credits no address. The burn is clamped to the available balance
    /// and the amount actually removed is returned.
    pub fn burn_from(&mut self, address: &str, amount: f64) -> f64 {
        let available = self.balance_of(address);
        let burned = amount.min(available);
        if burned > 0.0 {
            *self.balances.entry(address.to_owned()).or_insert(0.0) -= burned;
            self.burned += burned;
        }
        burned
    }

    /// Audits hash linkage and index continuity over the whole chain.
    /// Returns the index of the first broken block, if any.
    pub fn validate_chain(&self) -> Option<u32> {
        for window in self.chain.windows(2) {
            let (prev, next) = (&window[0], &window[1]);
            if next.previous_hash != prev.hash || next.index != prev.index + 1 {
                return Some(next.index);
            }
            if next.hash != next.compute_hash() {
                return Some(next.index);
            }
        }
        None
    }

    /// Discards blocks above `height`. The simple recovery policy: balances
    /// are not unwound, only the broken tail is dropped.
    pub fn truncate_to(&mut self, height: u32) {
        if (height as usize) < self.chain.len() && height >= 1 {
            warn!("truncating chain from height {} to {}", self.chain.len(), height);
            self.chain.truncate(height as usize);
        }
    }

}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nilotic_objects::{GENESIS_ADDRESS, GENESIS_ALLOCATION};

    fn signed(sender: &str, recipient: &str, amount: f64) -> Transaction {
        let mut tx = Transaction::new(sender, recipient, amount);
        tx.sign(&format!("{}-key", sender));
        tx
    }

    fn next_block(ledger: &Ledger) -> Block {
        let head = ledger.latest_block();
        Block::new(head.index + 1, head.hash.clone())
    }

    #[test]
    fn fresh_ledger_holds_genesis() {
        let ledger = Ledger::new();
        assert_eq!(ledger.height(), 1);
        assert_eq!(ledger.balance_of(GENESIS_ADDRESS), GENESIS_ALLOCATION);
        assert_eq!(ledger.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(ledger.mining_reward, DEFAULT_MINING_REWARD);
    }

    #[test]
    fn coinbase_credits_the_recipient() {
        let mut ledger = Ledger::new();
        let mut block = next_block(&ledger);
        block.add_transaction(Transaction::coinbase("alice", 100.0)).unwrap();
        block.seal();

        ledger.apply_block(&block).unwrap();
        assert_eq!(ledger.height(), 2);
        assert_eq!(ledger.balance_of("alice"), 100.0);
    }

    #[test]
    fn transfer_moves_balance_and_gates_on_funds() {
        let mut ledger = Ledger::new();
        let mut block = next_block(&ledger);
        block.add_transaction(Transaction::coinbase("alice", 100.0)).unwrap();
        block.add_transaction(signed("alice", "bob", 10.0)).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        assert_eq!(ledger.balance_of("alice"), 90.0);
        assert_eq!(ledger.balance_of("bob"), 10.0);

        let mut overdraft = next_block(&ledger);
        overdraft.add_transaction(signed("bob", "carol", 50.0)).unwrap();
        overdraft.seal();
        assert!(matches!(
            ledger.apply_block(&overdraft),
            Err(StorageError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn duplicate_transaction_is_rejected() {
        let mut ledger = Ledger::new();
        let tx = signed("GENESIS", "bob", 10.0);

        let mut block = next_block(&ledger);
        block.add_transaction(tx.clone()).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        let mut replay = next_block(&ledger);
        replay.add_transaction(tx).unwrap();
        replay.seal();
        assert!(matches!(
            ledger.apply_block(&replay),
            Err(StorageError::DuplicateTransaction(_))
        ));
    }

    #[test]
    fn contract_deployment_registers_code_without_balance_movement() {
        let mut ledger = Ledger::new();
        let tx = {
            let mut tx = Transaction::new_contract("alice", "PUSH 1");
            tx.sign("alice-key");
            tx
        };
        let expected_address = contract_address(&tx.hash);

        let mut block = next_block(&ledger);
        block.add_transaction(tx).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        assert_eq!(ledger.contract_code(&expected_address), Some("PUSH 1"));
        assert_eq!(ledger.balance_of("alice"), 0.0);
    }

    #[test]
    fn offline_transfer_moves_balance_and_is_counted() {
        let mut ledger = Ledger::new();
        let mut block = next_block(&ledger);
        block.add_transaction(Transaction::coinbase("alice", 50.0)).unwrap();
        let mut offline = Transaction::new_offline("alice", "bob", 20.0);
        offline.sign("alice-key");
        block.add_transaction(offline).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        assert_eq!(ledger.balance_of("alice"), 30.0);
        assert_eq!(ledger.balance_of("bob"), 20.0);
        assert_eq!(ledger.offline_transfers(), 1);
    }

    #[test]
    fn stake_and_unstake_move_value_between_tables() {
        let mut ledger = Ledger::new();
        ledger.stake(GENESIS_ADDRESS, 400.0).unwrap();
        assert_eq!(ledger.balance_of(GENESIS_ADDRESS), 600.0);
        assert_eq!(ledger.stake_of(GENESIS_ADDRESS), 400.0);

        ledger.unstake(GENESIS_ADDRESS, 150.0).unwrap();
        assert_eq!(ledger.balance_of(GENESIS_ADDRESS), 750.0);
        assert_eq!(ledger.stake_of(GENESIS_ADDRESS), 250.0);

        assert!(matches!(
            ledger.unstake(GENESIS_ADDRESS, 1000.0),
            Err(StorageError::InsufficientStake { .. })
        ));
        assert!(matches!(
            ledger.stake("nobody", 1.0),
            Err(StorageError::InsufficientFunds { .. })
        ));
    }

    #[test]
    fn chain_audit_finds_a_broken_link() {
        let mut ledger = Ledger::new();
        for _ in 0..3 {
            let mut block = next_block(&ledger);
            block.add_transaction(Transaction::coinbase("miner", 1.0)).unwrap();
            block.seal();
            ledger.apply_block(&block).unwrap();
        }
        assert_eq!(ledger.validate_chain(), None);

        ledger.chain[2].previous_hash = "tampered".to_owned();
        assert_eq!(ledger.validate_chain(), Some(2));

        ledger.truncate_to(2);
        assert_eq!(ledger.height(), 2);
    }

    #[test]
    fn conservation_holds_across_the_chain() {
        let mut ledger = Ledger::new();
        let mut block = next_block(&ledger);
        block.add_transaction(Transaction::coinbase("miner", 100.0)).unwrap();
        block.add_transaction(signed("GENESIS", "bob", 250.0)).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();
        ledger.stake("bob", 50.0).unwrap();
        assert_eq!(ledger.burn_from("miner", 0.5), 0.5);

        let issued: f64 = ledger
            .chain()
            .iter()
            .flat_map(|b| b.transactions.iter())
            .filter(|tx| tx.is_coinbase())
            .map(|tx| tx.amount)
            .sum();
        let balances: f64 = ledger.balances().values().sum();
        let stakes: f64 = ledger.stakes().values().sum();

        assert_eq!(issued + ledger.minted(), balances + stakes + ledger.burned());
        assert_eq!(ledger.burned(), 0.5);
    }

    #[test]
    fn burn_is_clamped_to_the_available_balance() {
        let mut ledger = Ledger::new();
        let mut block = next_block(&ledger);
        block.add_transaction(Transaction::coinbase("miner", 2.0)).unwrap();
        block.seal();
        ledger.apply_block(&block).unwrap();

        assert_eq!(ledger.burn_from("miner", 5.0), 2.0);
        assert_eq!(ledger.balance_of("miner"), 0.0);
        assert_eq!(ledger.burned(), 2.0);
    }
}
