use std::fs;
use std::path::Path;

use anyhow::Context;
use seal_node::NodeConfig;
use seal_server::ServerConfig;
use serde::{Deserialize, Serialize};

use crate::cli::ServeArgs;

/// Everything read from the configuration file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub node: NodeConfig,
    pub server: ServerConfig,
}

impl AppConfig {
    /// Load `path`, or the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read config file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    /// Apply `serve` flags on top of file values.
    pub fn apply_overrides(&mut self, args: &ServeArgs) {
        if let Some(port) = args.port {
            self.server = self.server.clone().with_port(port);
        }
        if let Some(ledger) = &args.ledger {
            self.node.ledger_path = ledger.clone();
        }
        if let Some(difficulty) = args.difficulty {
            self.node.difficulty = difficulty;
        }
        if let Some(block_size) = args.block_size {
            self.node.block_size = block_size;
        }
        if args.no_resume {
            self.node.resume = false;
        }
    }
}
