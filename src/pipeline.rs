//! End-to-end mining: encode, mine itemsets, derive rules

use crate::config::MiningParams;
use crate::encoder::OccurrenceMatrix;
use crate::error::MiningResult;
use crate::miner::{mine_frequent_itemsets, FrequentItemsets};
use crate::rules::{generate_rules, AssociationRule};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::{info, warn};

/// Immutable result of one mining run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningOutput {
    /// Parameters the output was computed with
    pub params: MiningParams,
    /// Distinct items in the encoded data
    pub items: Vec<String>,
    pub itemsets: FrequentItemsets,
    pub rules: Vec<AssociationRule>,
}

impl MiningOutput {
    pub fn has_itemsets(&self) -> bool {
        !self.itemsets.is_empty()
    }

    pub fn has_rules(&self) -> bool {
        !self.rules.is_empty()
    }
}

/// Mine raw ingredient records with `params`.
pub fn mine<S: AsRef<str>>(records: &[S], params: &MiningParams) -> MiningResult<MiningOutput> {
    run(records, params, None)
}

/// Like [`mine`], but abort between levels once `deadline` has passed
pub fn mine_until<S: AsRef<str>>(
    records: &[S],
    params: &MiningParams,
    deadline: Instant,
) -> MiningResult<MiningOutput> {
    run(records, params, Some(deadline))
}

/// Mine an already-encoded matrix
pub fn mine_matrix(
    matrix: &OccurrenceMatrix,
    params: &MiningParams,
    deadline: Option<Instant>,
) -> MiningResult<MiningOutput> {
    params.validate()?;

    let mut options = params.mining_options();
    if let Some(deadline) = deadline {
        options = options.with_deadline(deadline);
    }

    let itemsets = mine_frequent_itemsets(matrix, &options)?;
    info!(
        transactions = matrix.n_transactions(),
        items = matrix.n_items(),
        itemsets = itemsets.len(),
        min_support = params.min_support,
        "mined frequent itemsets"
    );
    if itemsets.is_empty() {
        warn!(min_support = params.min_support, "no frequent itemsets found");
    }

    let rules = generate_rules(&itemsets, &params.rule_options())?;
    if rules.is_empty() && !itemsets.is_empty() {
        warn!(
            metric = %params.metric,
            threshold = params.min_confidence,
            "no association rules found"
        );
    }

    Ok(MiningOutput {
        params: params.clone(),
        items: matrix.items().to_vec(),
        itemsets,
        rules,
    })
}

fn run<S: AsRef<str>>(
    records: &[S],
    params: &MiningParams,
    deadline: Option<Instant>,
) -> MiningResult<MiningOutput> {
    // Reject bad thresholds before paying for the encoding
    params.validate()?;
    let matrix = params.encoder().encode(records);
    mine_matrix(&matrix, params, deadline)
}
