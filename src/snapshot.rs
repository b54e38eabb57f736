//! Saved mining results that can be reloaded instead of recomputed

use crate::config::MiningParams;
use crate::error::MiningResult;
use crate::pipeline::{mine, MiningOutput};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use tracing::info;

/// Source transactions together with the output mined from them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningSnapshot {
    pub transactions: Vec<String>,
    pub output: MiningOutput,
}

impl MiningSnapshot {
    /// Mine `transactions` and keep them alongside the result
    pub fn compute(transactions: Vec<String>, params: &MiningParams) -> MiningResult<Self> {
        let output = mine(&transactions, params)?;
        Ok(Self {
            transactions,
            output,
        })
    }

    /// The stored output is valid for this source and these parameters
    pub fn matches(&self, transactions: &[String], params: &MiningParams) -> bool {
        self.output.params == *params && self.transactions == transactions
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let path = path.as_ref();
        let file = File::create(path)
            .with_context(|| format!("Failed to create snapshot {}", path.display()))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open snapshot {}", path.display()))?;
        let snapshot = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Corrupt snapshot {}", path.display()))?;
        Ok(snapshot)
    }
}

/// Reuse `cached` when it was computed from the same source and parameters,
/// otherwise mine afresh.
///
/// Returns the snapshot and whether it was reused.
pub fn mine_or_reuse(
    cached: Option<MiningSnapshot>,
    transactions: Vec<String>,
    params: &MiningParams,
) -> MiningResult<(MiningSnapshot, bool)> {
    match cached {
        Some(snapshot) if snapshot.matches(&transactions, params) => {
            info!(rules = snapshot.output.rules.len(), "reusing stored mining snapshot");
            Ok((snapshot, true))
        }
        _ => Ok((MiningSnapshot::compute(transactions, params)?, false)),
    }
}
