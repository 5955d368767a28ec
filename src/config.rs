use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Whether a transfer may leave the source below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdraftPolicy {
    /// Any integer amount is accepted and balances may go negative.
    #[default]
    Allow,
    /// Negative amounts and negative resulting source balances are rejected.
    Deny,
}

/// How a transfer reacts when its second write fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Source then destination, no recovery. A failed destination write
    /// leaves the source debited.
    Sequential,
    /// Source then destination; on destination failure the previous source
    /// value is written back.
    #[default]
    Compensating,
}

impl std::str::FromStr for WriteMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "sequential" => Ok(WriteMode::Sequential),
            "compensating" => Ok(WriteMode::Compensating),
            other => Err(format!(
                "unknown write mode {other:?} (expected sequential|compensating)"
            )),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    pub overdraft: OverdraftPolicy,
    pub write_mode: WriteMode,
}

impl ContractConfig {
    /// Reads a JSON config file. Missing fields fall back to defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        serde_json::from_str(&data).with_context(|| format!("parse config {}", path.display()))
    }
}
