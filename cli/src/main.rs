//! chainsock CLI: query a node and watch blocks over WebSocket.
//!
//! Usage:
//! ```bash
//! # Current head
//! chainsock block-number --url ws://127.0.0.1:8546
//!
//! # Log every new block with its transaction count
//! chainsock watch --url ws://127.0.0.1:8546 --from 19000000
//!
//! # Hash helpers (offline)
//! chainsock selector "transfer(address,uint256)"
//! chainsock topic "Transfer(address,address,uint256)"
//! ```

use std::collections::HashMap;
use std::env;
use std::process;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chainsock::chainsock_ws::WsTransport;
use chainsock::{ClientConfig, Web3Client};
use chainsock_core::{keccak, Uint256};
use chainsock_filter::{BlockHandler, BlockSource, FilterError, Poller, RpcSource};
use serde::{Deserialize, Serialize};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    let rest = &args[2..];
    init_tracing(&LogConfig {
        json: rest.iter().any(|a| a == "--log-json"),
        ..LogConfig::default()
    });

    let result = match args[1].as_str() {
        "block-number" => cmd_block_number(rest).await,
        "watch" => cmd_watch(rest).await,
        "selector" => cmd_selector(rest),
        "topic" => cmd_topic(rest),
        "version" | "--version" | "-V" => {
            println!("chainsock {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn print_usage() {
    println!("chainsock {}", env!("CARGO_PKG_VERSION"));
    println!("Query an Ethereum node and watch blocks over WebSocket\n");
    println!("USAGE:");
    println!("    chainsock <COMMAND> [FLAGS]\n");
    println!("COMMANDS:");
    println!("    block-number  Print the current head block number");
    println!("    watch         Log every new block and its transaction count");
    println!("    selector      Print the 4-byte selector of a function signature");
    println!("    topic         Print the topic hash of an event signature");
    println!("    version       Print version");
    println!("    help          Print this help\n");
    println!("FLAGS:");
    println!("    --url <URL>       WebSocket endpoint (ws:// or wss://)");
    println!("    --config <FILE>   JSON client config; --url overrides its url");
    println!("    --from <N>        First block for `watch` (default: current head)");
    println!("    --log-json        Emit JSON structured logs");
}

/// Log level and format.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct LogConfig {
    /// "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    level: String,
    /// Per-crate overrides: crate name → level
    #[serde(default)]
    components: HashMap<String, String>,
    #[serde(default)]
    json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: HashMap::new(),
            json: false,
        }
    }
}

/// `RUST_LOG` wins over the config when set.
fn init_tracing(config: &LogConfig) {
    let mut directives = config.level.clone();
    for (component, level) in &config.components {
        directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
    }

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&directives))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn parse_flag(args: &[String], flag: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == flag)?;
    args.get(pos + 1).cloned()
}

/// First argument that is neither a flag nor a flag's value.
fn positional(args: &[String]) -> Option<&str> {
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--log-json" => {}
            a if a.starts_with("--") => {
                iter.next();
            }
            a => return Some(a),
        }
    }
    None
}

fn load_config(args: &[String]) -> Result<ClientConfig> {
    let mut config = match parse_flag(args, "--config") {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {path}"))?;
            ClientConfig::from_json(&text)?
        }
        None => {
            let url = parse_flag(args, "--url").ok_or_else(|| anyhow!("--url is required"))?;
            ClientConfig::new(url)
        }
    };
    if let Some(url) = parse_flag(args, "--url") {
        config.url = url;
    }
    if let Some(from) = parse_flag(args, "--from") {
        config.start_block = Some(from.parse().with_context(|| format!("invalid --from '{from}'"))?);
    }
    config.validate()?;
    Ok(config)
}

async fn cmd_block_number(args: &[String]) -> Result<()> {
    let client = Web3Client::connect(load_config(args)?)?;
    let head = client.block_number().await;
    client.close().await;
    let head = head?;
    println!("{} ({})", head, head.to_quantity());
    Ok(())
}

/// Prints each delivered block with its transaction count.
struct BlockLogger {
    source: RpcSource<WsTransport>,
}

#[async_trait]
impl BlockHandler for BlockLogger {
    async fn on_block(&self, number: Uint256) -> Result<(), FilterError> {
        let block = self.source.block(number).await?.ok_or_else(|| FilterError::Missing {
            kind: "block",
            id: number.to_string(),
        })?;
        tracing::info!(
            block = %number,
            hash = %block.hash,
            transactions = block.transactions.len(),
            "new block"
        );
        Ok(())
    }
}

async fn cmd_watch(args: &[String]) -> Result<()> {
    let config = load_config(args)?;
    let poller_config = config.poller_config()?;
    let client = Web3Client::connect(config)?;

    let source = RpcSource::new(Arc::clone(client.transport()));
    let logger = Arc::new(BlockLogger {
        source: source.clone(),
    });
    let poller = Arc::new(Poller::new(source, logger, poller_config));

    let mut task = tokio::spawn({
        let poller = Arc::clone(&poller);
        async move { poller.run().await }
    });

    let joined = tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("waiting for ctrl-c")?;
            tracing::info!("interrupted, shutting down");
            poller.stop();
            None
        }
        joined = &mut task => Some(joined),
    };
    let outcome = match joined {
        Some(joined) => joined,
        None => task.await,
    }
    .context("poller task")?;

    client.close().await;
    outcome.map_err(Into::into)
}

fn cmd_selector(args: &[String]) -> Result<()> {
    let signature = positional(args).ok_or_else(|| anyhow!("missing function signature"))?;
    if !signature.contains('(') {
        bail!("'{signature}' is not a signature like name(type,...)");
    }
    println!("{}", keccak::selector(signature));
    Ok(())
}

fn cmd_topic(args: &[String]) -> Result<()> {
    let signature = positional(args).ok_or_else(|| anyhow!("missing event signature"))?;
    if !signature.contains('(') {
        bail!("'{signature}' is not a signature like Name(type,...)");
    }
    println!("{}", keccak::signature_hash(signature));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn flags_and_positionals() {
        let a = args(&["--url", "ws://x", "--log-json", "transfer(address,uint256)"]);
        assert_eq!(parse_flag(&a, "--url").as_deref(), Some("ws://x"));
        assert_eq!(positional(&a), Some("transfer(address,uint256)"));
        assert_eq!(parse_flag(&a, "--from"), None);
    }

    #[test]
    fn config_from_flags() {
        let c = load_config(&args(&["--url", "wss://node", "--from", "42"])).unwrap();
        assert_eq!(c.url, "wss://node");
        assert_eq!(c.start_block, Some(42));
        assert!(load_config(&args(&["--from", "1"])).is_err());
        assert!(load_config(&args(&["--url", "http://node"])).is_err());
    }
}
