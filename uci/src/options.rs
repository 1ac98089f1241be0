use std::time::Duration;

use anyhow::Result;
use common::Config;

pub struct UciOptions {
    pub command: String,
    pub args: Vec<String>,
    pub timeout: Duration,
    pub threads: Option<u32>,
    pub hash_mb: Option<u32>,
    /// Keep one engine process for the whole invocation instead of one per evaluation.
    pub persistent: bool,
}

impl UciOptions {
    pub fn new(command: impl Into<String>) -> Self {
        UciOptions {
            command: command.into(),
            args: vec![],
            timeout: Duration::from_secs(60),
            threads: None,
            hash_mb: None,
            persistent: true,
        }
    }
}

impl Default for UciOptions {
    fn default() -> Self {
        Self::new("stockfish")
    }
}

impl Config for UciOptions {
    fn load(config: &common::ConfigLoader) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            command: config
                .get("engine_command")
                .and_then(|v| v.as_string())
                .unwrap_or(defaults.command),
            args: config
                .get("engine_args")
                .and_then(|v| v.as_string())
                .map(|args| args.split_whitespace().map(str::to_string).collect())
                .unwrap_or(defaults.args),
            timeout: config
                .get("engine_timeout")
                .and_then(|v| v.as_u64())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            threads: config.get("engine_threads").and_then(|v| v.as_u32()),
            hash_mb: config.get("engine_hash").and_then(|v| v.as_u32()),
            persistent: config
                .get("engine_persistent")
                .and_then(|v| v.as_bool())
                .unwrap_or(defaults.persistent),
        })
    }
}
