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

use crate::NodeError;
use nilotic_consensus::ConsensusParameters;
use nilotic_network::{HANDSHAKE_TIMEOUT_SECS, PING_INTERVAL_SECS};

use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
};

/// The operator configuration: a TOML file overridden by CLI flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// The port the node listens on.
    pub port: u16,
    /// The directory holding the chain snapshot and contribution state.
    pub data_dir: PathBuf,
    /// Whether debug logging is enabled.
    pub debug: bool,
    /// Whether the background mining loop starts with the node.
    pub mine: bool,
    /// The address credited with mining rewards.
    pub miner_address: String,
    /// This node's identifier on the wire.
    pub node_id: String,
    /// The maximum number of connected peers.
    pub max_peers: u16,
    /// Seconds a pending handshake may take.
    pub handshake_timeout_secs: u64,
    /// Seconds between keep-alive pings.
    pub ping_interval_secs: u64,
    /// Seconds between background chain audits.
    pub audit_interval_secs: u64,
    /// Seconds between metrics reports.
    pub metrics_interval_secs: u64,
    /// Consensus parameter overrides.
    pub consensus: ConsensusParameters,
}

impl Default for Config {
    fn default() -> Self {
        let nonce: u64 = thread_rng().gen();
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("nilotic");
        Self {
            port: 5500,
            data_dir,
            debug: false,
            mine: false,
            miner_address: String::new(),
            node_id: format!("node-{:016x}", nonce),
            max_peers: 50,
            handshake_timeout_secs: HANDSHAKE_TIMEOUT_SECS,
            ping_interval_secs: PING_INTERVAL_SECS,
            audit_interval_secs: 60,
            metrics_interval_secs: 30,
            consensus: ConsensusParameters::default(),
        }
    }
}

impl Config {
    /// Reads a TOML config file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, NodeError> {
        match path {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                Ok(toml::from_str(&contents)?)
            }
            None => Ok(Self::default()),
        }
    }

    /// The address the network listener binds to.
    pub fn listen_address(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }

    /// Where the chain snapshot lives.
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join("chain.json")
    }

    /// Where the contribution engine keeps its durable state.
    pub fn porc_dir(&self) -> PathBuf {
        self.data_dir.join("porc")
    }
}
