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

use crate::{Contribution, Pool, PorcError, Task, WalletStatus};

use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    fs,
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::PathBuf,
};

/// The durable engine state written as one JSON document.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PorcState {
    pub wallets: HashMap<String, WalletStatus>,
    pub pools: Vec<Pool>,
    pub tasks: HashMap<String, Task>,
    /// Lifetime enrollment count; determines early-adopter status.
    pub enrollments: usize,
}

/// Durable storage for the engine: a JSON state snapshot plus an
/// append-only log of verified contributions.
#[derive(Debug, Clone)]
pub struct PorcStore {
    directory: PathBuf,
}

impl PorcStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.directory.join("porc_state.json")
    }

    fn log_path(&self) -> PathBuf {
        self.directory.join("contributions.log")
    }

    /// Writes the wallet, pool, and task tables.
    pub fn save_state(&self, state: &PorcState) -> Result<(), PorcError> {
        fs::create_dir_all(&self.directory)?;
        let file = File::create(self.state_path())?;
        serde_json::to_writer_pretty(BufWriter::new(file), state)?;
        Ok(())
    }

    /// Reads the engine state back, or `None` when nothing was saved yet.
    pub fn load_state(&self) -> Result<Option<PorcState>, PorcError> {
        let path = self.state_path();
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path)?;
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }

    /// Appends one verified contribution to the log. The log is append-only
    /// and never rewritten.
    pub fn append_contribution(&self, contribution: &Contribution) -> Result<(), PorcError> {
        fs::create_dir_all(&self.directory)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path())?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, contribution)?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    /// Reads the whole contribution log in submission order.
    pub fn read_contributions(&self) -> Result<Vec<Contribution>, PorcError> {
        let path = self.log_path();
        if !path.exists() {
            return Ok(vec![]);
        }
        let reader = BufReader::new(File::open(path)?);
        let mut contributions = vec![];
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            contributions.push(serde_json::from_str(&line)?);
        }
        Ok(contributions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};

    fn scratch_store() -> PorcStore {
        let nonce: u64 = thread_rng().gen();
        let mut path = std::env::temp_dir();
        path.push(format!("nilotic-porc-store-{}", nonce));
        PorcStore::new(path)
    }

    #[test]
    fn state_round_trips_through_disk() {
        let store = scratch_store();
        let mut state = PorcState::default();
        state
            .wallets
            .insert("alice".into(), WalletStatus::new("alice", 50.0, true));
        state.enrollments = 1;

        store.save_state(&state).unwrap();
        let restored = store.load_state().unwrap().unwrap();
        assert_eq!(restored.wallets, state.wallets);
        assert_eq!(restored.enrollments, 1);
    }

    #[test]
    fn missing_state_reads_as_none() {
        let store = scratch_store();
        assert!(store.load_state().unwrap().is_none());
    }

    #[test]
    fn the_contribution_log_appends_in_order() {
        let store = scratch_store();
        let first = Contribution::new("alice", "task-1", 1, 1.0, 0, 60);
        let second = Contribution::new("bob", "task-2", 2, 2.0, 10, 120);

        store.append_contribution(&first).unwrap();
        store.append_contribution(&second).unwrap();

        let log = store.read_contributions().unwrap();
        assert_eq!(log, vec![first, second]);
    }
}
