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

use nilotic::{Config, Node};

use clap::{App, Arg};
use colored::Colorize;
use std::{path::Path, process};
use tracing::{error, info};

fn parse_config() -> anyhow::Result<Config> {
    let matches = App::new("nilotic")
        .version(env!("CARGO_PKG_VERSION"))
        .about("A permissioned blockchain node")
        .arg(
            Arg::with_name("port")
                .long("port")
                .takes_value(true)
                .help("The port the node listens on"),
        )
        .arg(
            Arg::with_name("data-dir")
                .long("data-dir")
                .takes_value(true)
                .help("The directory holding the chain snapshot and engine state"),
        )
        .arg(
            Arg::with_name("debug")
                .long("debug")
                .help("Enables debug logging"),
        )
        .arg(
            Arg::with_name("mine")
                .long("mine")
                .help("Starts the background mining loop"),
        )
        .arg(
            Arg::with_name("miner-address")
                .long("miner-address")
                .takes_value(true)
                .help("The address credited with mining rewards"),
        )
        .arg(
            Arg::with_name("config")
                .long("config")
                .takes_value(true)
                .help("A TOML config file; flags override its values"),
        )
        .get_matches();

    let mut config = Config::load(matches.value_of("config").map(Path::new))?;
    if let Some(port) = matches.value_of("port") {
        config.port = port.parse()?;
    }
    if let Some(data_dir) = matches.value_of("data-dir") {
        config.data_dir = data_dir.into();
    }
    if matches.is_present("debug") {
        config.debug = true;
    }
    if matches.is_present("mine") {
        config.mine = true;
    }
    if let Some(miner_address) = matches.value_of("miner-address") {
        config.miner_address = miner_address.to_owned();
    }
    Ok(config)
}

#[tokio::main]
async fn main() {
    let config = match parse_config() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("invalid configuration: {}", error);
            process::exit(2);
        }
    };

    let level = if config.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    println!(
        "{} v{}",
        "NILOTIC".bold().cyan(),
        env!("CARGO_PKG_VERSION").to_string().bold()
    );

    let node = match Node::new(config) {
        Ok(node) => node,
        Err(error) => {
            error!("initialization failed: {}", error);
            process::exit(1);
        }
    };
    if let Err(error) = node.start().await {
        error!("startup failed: {}", error);
        process::exit(1);
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("interrupt received, shutting down"),
        Err(error) => error!("failed to listen for the interrupt signal: {}", error),
    }
    node.stop().await;
}
