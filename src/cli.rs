//! Command-line interface definitions and argument parsing

use crate::catalog::{CatalogColumns, SkinType};
use crate::config::MiningParams;
use crate::recommend::normalize_selection;
use crate::rules::RuleMetric;
use clap::Parser;
use std::collections::BTreeSet;

/// Mine frequently co-occurring skincare ingredients and recommend companions
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the product catalog CSV
    #[arg(short, long, default_value = "cosmetics.csv")]
    pub input: String,

    /// Name of the column holding the ingredient list
    #[arg(long, default_value = "Ingredients")]
    pub ingredient_column: String,

    /// YAML file with mining parameters; flags below override it
    #[arg(short, long)]
    pub config: Option<String>,

    /// Minimum support for frequent itemsets (0-1)
    #[arg(short = 's', long)]
    pub min_support: Option<f64>,

    /// Minimum threshold for the rule metric (confidence by default)
    #[arg(short = 't', long)]
    pub min_confidence: Option<f64>,

    /// Metric gating rules: confidence, lift, support or leverage
    #[arg(short, long)]
    pub metric: Option<RuleMetric>,

    /// Separator between ingredients in a record
    #[arg(short, long)]
    pub delimiter: Option<char>,

    /// Largest itemset size to mine
    #[arg(long)]
    pub max_len: Option<usize>,

    /// Keep at most this many rules overall
    #[arg(long)]
    pub max_rules: Option<usize>,

    /// Ingredient you currently use (repeatable)
    /// Example: --with niacinamide --with "hyaluronic acid"
    #[arg(short = 'w', long = "with")]
    pub selected: Vec<String>,

    /// Only mine products flagged for this skin type
    #[arg(long)]
    pub skin_type: Option<SkinType>,

    /// Number of rows shown in each table
    #[arg(short = 'n', long, default_value = "10")]
    pub top: usize,

    /// Write all rules to this CSV file
    #[arg(short, long)]
    pub export: Option<String>,

    /// JSON snapshot to reuse when inputs are unchanged, refreshed after mining
    #[arg(long)]
    pub snapshot: Option<String>,

    /// Log filter used when not verbose (e.g. "info", "ingredientforge=debug")
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Resolve mining parameters: defaults, then config file, then explicit flags
    pub fn mining_params(&self) -> crate::Result<MiningParams> {
        let mut params = match &self.config {
            Some(path) => MiningParams::from_file(path)?,
            None => MiningParams::default(),
        };

        if let Some(min_support) = self.min_support {
            params.min_support = min_support;
        }
        if let Some(min_confidence) = self.min_confidence {
            params.min_confidence = min_confidence;
        }
        if let Some(metric) = self.metric {
            params.metric = metric;
        }
        if let Some(delimiter) = self.delimiter {
            params.delimiter = delimiter;
        }
        if self.max_len.is_some() {
            params.max_len = self.max_len;
        }
        if self.max_rules.is_some() {
            params.top_n = self.max_rules;
        }

        params.validate()?;
        Ok(params)
    }

    pub fn catalog_columns(&self) -> CatalogColumns {
        CatalogColumns {
            ingredients: self.ingredient_column.clone(),
            ..CatalogColumns::default()
        }
    }

    /// Selected ingredients, normalized like catalog items
    pub fn selection(&self) -> BTreeSet<String> {
        normalize_selection(&self.selected)
    }

    /// Log filter directive
    pub fn log_filter(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.log_level
        }
    }
}
