//! Mining parameters and their YAML representation

use crate::encoder::{TransactionEncoder, DEFAULT_DELIMITER};
use crate::error::{check_range, MiningResult};
use crate::miner::MiningOptions;
use crate::rules::{RuleMetric, RuleOptions};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Thresholds and encoding settings for one mining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningParams {
    pub min_support: f64,
    /// Threshold applied to `metric`
    pub min_confidence: f64,
    pub metric: RuleMetric,
    pub delimiter: char,
    pub max_len: Option<usize>,
    pub top_n: Option<usize>,
}

impl Default for MiningParams {
    fn default() -> Self {
        Self {
            min_support: 0.05,
            min_confidence: 0.5,
            metric: RuleMetric::Confidence,
            delimiter: DEFAULT_DELIMITER,
            max_len: None,
            top_n: None,
        }
    }
}

impl MiningParams {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> crate::Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid mining config")
    }

    /// Save to YAML string
    pub fn to_yaml(&self) -> crate::Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::from_yaml(&text)
    }

    /// Check every threshold before any mining starts
    pub fn validate(&self) -> MiningResult<()> {
        check_range("support", self.min_support, 0.0, 1.0, "[0, 1]")?;
        self.rule_options().metric.validate(self.min_confidence)
    }

    pub fn encoder(&self) -> TransactionEncoder {
        TransactionEncoder::new(self.delimiter)
    }

    pub fn mining_options(&self) -> MiningOptions {
        MiningOptions::new(self.min_support).with_max_len(self.max_len)
    }

    pub fn rule_options(&self) -> RuleOptions {
        RuleOptions {
            metric: self.metric,
            min_threshold: self.min_confidence,
            top_n: self.top_n,
        }
    }
}
