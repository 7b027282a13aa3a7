//! Subscriber setup for the `chainbatch` binary.
//!
//! Per-item failure records and batch summaries are emitted by
//! `chainbatch_core` at `warn` / `info`; RPC traffic by `chainbatch_rpc` at
//! `debug` / `trace`. Everything goes to stderr.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Level used when neither the config file nor `RUST_LOG` sets one. Shows
/// failure records and fee fallbacks, hides batch progress.
const DEFAULT_LEVEL: &str = "warn";

/// The `log:` section of the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Per-crate levels, e.g. `chainbatch-rpc: trace`.
    #[serde(default)]
    pub crates: BTreeMap<String, String>,
    /// One JSON object per event instead of text lines.
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    DEFAULT_LEVEL.to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            crates: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// `EnvFilter` directives, e.g. `"warn,chainbatch_rpc=trace"`. `-v`
    /// raises the base level to `debug`; per-crate levels still apply.
    pub fn directives(&self, verbose: bool) -> String {
        let base = if verbose { "debug" } else { self.level.as_str() };
        self.crates
            .iter()
            .fold(base.to_string(), |mut out, (krate, level)| {
                out.push_str(&format!(",{}={}", krate.replace('-', "_"), level));
                out
            })
    }
}

/// Install the global subscriber. `RUST_LOG`, when set and valid, replaces
/// the configured directives.
pub fn init_tracing(config: &LogConfig, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.directives(verbose)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL));

    let registry = tracing_subscriber::registry().with(filter);
    if config.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
}
