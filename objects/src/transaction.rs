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
    errors::TransactionError,
    hash::{amount_text, sha256_hex, timestamp_now},
    COINBASE_ADDRESS,
    CONTRACT_ADDRESS,
};

use serde::{Deserialize, Serialize};

/// A value-bearing record, immutable after creation.
///
/// The `hash` fingerprints the canonical fields; the `signature` is a
/// simulated digest over `hash ++ key` and carries no cryptographic strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The funding address, or the `COINBASE` sentinel for minted value.
    pub sender: String,
    /// The receiving address, or the `CONTRACT` sentinel for deployments.
    pub recipient: String,
    /// The transferred amount; never negative.
    pub amount: f64,
    /// Creation time in Unix seconds.
    pub timestamp: i64,
    /// Whether this transfer was captured offline for later redemption.
    pub is_offline: bool,
    /// Contract source attached to a deployment.
    pub contract_code: Option<String>,
    /// Serialized contract state attached to a deployment.
    pub contract_state: Option<String>,
    /// Simulated signature; empty until `sign` is called.
    pub signature: String,
    /// Digest of the canonical fields.
    pub hash: String,
}

impl Transaction {
    /// Creates an unsigned transfer stamped with the current time.
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        Self::new_at(sender, recipient, amount, timestamp_now())
    }

    /// Creates an unsigned transfer with an explicit timestamp.
    pub fn new_at(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: f64,
        timestamp: i64,
    ) -> Self {
        let mut tx = Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp,
            is_offline: false,
            contract_code: None,
            contract_state: None,
            signature: String::new(),
            hash: String::new(),
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Creates a coinbase transaction minting `amount` to `recipient`.
    pub fn coinbase(recipient: impl Into<String>, amount: f64) -> Self {
        Self::new_at(COINBASE_ADDRESS, recipient, amount, timestamp_now())
    }

    /// Creates an unsigned contract deployment carrying the given code.
    pub fn new_contract(sender: impl Into<String>, contract_code: impl Into<String>) -> Self {
        let mut tx = Self {
            sender: sender.into(),
            recipient: CONTRACT_ADDRESS.to_owned(),
            amount: 0.0,
            timestamp: timestamp_now(),
            is_offline: false,
            contract_code: Some(contract_code.into()),
            contract_state: None,
            signature: String::new(),
            hash: String::new(),
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Creates an unsigned offline transfer for later redemption tracking.
    pub fn new_offline(sender: impl Into<String>, recipient: impl Into<String>, amount: f64) -> Self {
        let mut tx = Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            timestamp: timestamp_now(),
            is_offline: true,
            contract_code: None,
            contract_state: None,
            signature: String::new(),
            hash: String::new(),
        };
        tx.hash = tx.compute_hash();
        tx
    }

    /// Recomputes the digest of the canonical fields.
    pub fn compute_hash(&self) -> String {
        let mut preimage = format!(
            "{}{}{}{}",
            self.sender,
            self.recipient,
            amount_text(self.amount),
            self.timestamp
        );
        if let Some(code) = &self.contract_code {
            if !code.is_empty() {
                preimage.push_str("CONTRACT:");
                preimage.push_str(code);
            }
        }
        preimage.push_str(if self.is_offline { "OFFLINE:true" } else { "OFFLINE:false" });
        sha256_hex(&preimage)
    }

    /// Attaches a simulated signature derived from the hash and the key.
    /// Coinbase transactions are never signed.
    pub fn sign(&mut self, key: &str) {
        if !self.is_coinbase() {
            self.signature = sha256_hex(&format!("{}{}", self.hash, key));
        }
    }

    /// Returns `true` when the signature requirement holds.
    pub fn verify(&self) -> bool {
        self.is_coinbase() || !self.signature.is_empty()
    }

    /// Returns `true` when this transaction mints new value.
    #[inline]
    pub fn is_coinbase(&self) -> bool {
        self.sender == COINBASE_ADDRESS
    }

    /// Returns `true` when this transaction deploys contract code.
    #[inline]
    pub fn is_contract_deployment(&self) -> bool {
        self.recipient == CONTRACT_ADDRESS
            && self.contract_code.as_deref().map_or(false, |code| !code.is_empty())
    }

    /// The structural validity predicate applied at submission and in blocks.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like `is_valid`, but reports which rule failed.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.amount < 0.0 {
            return Err(TransactionError::NegativeAmount(self.amount));
        }
        if self.sender.is_empty() {
            return Err(TransactionError::MissingSender);
        }
        if self.is_coinbase() {
            return Ok(());
        }
        if !self.is_offline && self.recipient.is_empty() {
            return Err(TransactionError::MissingRecipient);
        }
        if self.signature.is_empty() {
            return Err(TransactionError::MissingSignature(self.hash.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_commits_to_canonical_fields() {
        let tx = Transaction::new_at("alice", "bob", 10.0, 1_700_000_000);
        let expected = sha256_hex("alicebob10.0000001700000000OFFLINE:false");
        assert_eq!(tx.hash, expected);
        assert_eq!(tx.hash, tx.compute_hash());
    }

    #[test]
    fn contract_code_is_part_of_the_preimage() {
        let plain = Transaction::new_at("alice", "bob", 1.0, 1);
        let mut with_code = plain.clone();
        with_code.contract_code = Some("PUSH 1".to_owned());
        assert_ne!(plain.compute_hash(), with_code.compute_hash());
    }

    #[test]
    fn empty_contract_code_is_ignored_in_the_preimage() {
        let plain = Transaction::new_at("alice", "bob", 1.0, 1);
        let mut with_empty = plain.clone();
        with_empty.contract_code = Some(String::new());
        assert_eq!(plain.compute_hash(), with_empty.compute_hash());
    }

    #[test]
    fn unsigned_transfer_is_invalid_until_signed() {
        let mut tx = Transaction::new("alice", "bob", 5.0);
        assert!(!tx.is_valid());
        tx.sign("alice-key");
        assert!(tx.is_valid());
        assert!(tx.verify());
    }

    #[test]
    fn coinbase_is_unconditionally_valid_and_never_signed() {
        let mut tx = Transaction::coinbase("miner", 100.0);
        assert!(tx.is_valid());
        tx.sign("some-key");
        assert!(tx.signature.is_empty());
    }

    #[test]
    fn negative_amount_is_rejected() {
        let mut tx = Transaction::new("alice", "bob", -1.0);
        tx.sign("alice-key");
        assert!(!tx.is_valid());
    }

    #[test]
    fn validate_reports_the_failed_rule() {
        let unsigned = Transaction::new("alice", "bob", 5.0);
        assert!(matches!(
            unsigned.validate(),
            Err(TransactionError::MissingSignature(_))
        ));

        let mut negative = Transaction::new("alice", "bob", -1.0);
        negative.sign("alice-key");
        assert!(matches!(
            negative.validate(),
            Err(TransactionError::NegativeAmount(_))
        ));

        let mut no_recipient = Transaction::new("alice", "", 5.0);
        no_recipient.sign("alice-key");
        assert!(matches!(
            no_recipient.validate(),
            Err(TransactionError::MissingRecipient)
        ));
    }

    #[test]
    fn offline_transfer_tolerates_empty_recipient() {
        let mut tx = Transaction::new_offline("alice", "", 5.0);
        tx.sign("alice-key");
        assert!(tx.is_valid());
    }

    #[test]
    fn contract_deployment_is_detected() {
        let tx = Transaction::new_contract("alice", "PUSH 1");
        assert!(tx.is_contract_deployment());
        assert!(!Transaction::new("alice", "bob", 1.0).is_contract_deployment());
    }

    #[test]
    fn serde_round_trip_preserves_the_hash() {
        let mut tx = Transaction::new("alice", "bob", 12.5);
        tx.sign("alice-key");

        let bytes = bincode::serialize(&tx).unwrap();
        let decoded: Transaction = bincode::deserialize(&bytes).unwrap();
        assert_eq!(tx, decoded);
        assert_eq!(decoded.hash, decoded.compute_hash());

        let json = serde_json::to_string(&tx).unwrap();
        let decoded: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(tx, decoded);
    }
}
