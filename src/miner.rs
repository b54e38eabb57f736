//! Level-wise Apriori mining of frequent itemsets
//!
//! Candidates of size k are joined from frequent (k-1)-itemsets that share
//! a (k-2)-prefix, and any candidate with an infrequent (k-1)-subset is
//! discarded before its support is counted. Only the survivors are checked
//! against the occurrence matrix.

use crate::encoder::OccurrenceMatrix;
use crate::error::{check_range, MiningError, MiningResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

/// Tolerance for threshold comparisons
pub const SUPPORT_EPSILON: f64 = 1e-9;

/// A frequent itemset and its support
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itemset {
    /// Member items in lexicographic order
    items: Vec<String>,
    /// Number of transactions containing every item
    count: usize,
    /// count / total transactions
    support: f64,
}

impl Itemset {
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn support(&self) -> f64 {
        self.support
    }

    pub fn contains(&self, item: &str) -> bool {
        self.items.binary_search_by(|candidate| candidate.as_str().cmp(item)).is_ok()
    }
}

/// Parameters for a mining pass
#[derive(Debug, Clone, Copy)]
pub struct MiningOptions {
    min_support: f64,
    max_len: Option<usize>,
    deadline: Option<Instant>,
}

impl MiningOptions {
    pub fn new(min_support: f64) -> Self {
        Self {
            min_support,
            max_len: None,
            deadline: None,
        }
    }

    /// Largest itemset size to mine
    #[must_use]
    pub fn with_max_len(mut self, max_len: Option<usize>) -> Self {
        self.max_len = max_len;
        self
    }

    /// Abort with [`MiningError::DeadlineExceeded`] if a level finishes past this instant
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn max_len(&self) -> Option<usize> {
        self.max_len
    }
}

/// All itemsets meeting a support threshold.
///
/// Ordered by ascending size, then descending support, then item names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequentItemsets {
    n_transactions: usize,
    min_support: f64,
    itemsets: Vec<Itemset>,
}

impl FrequentItemsets {
    pub fn n_transactions(&self) -> usize {
        self.n_transactions
    }

    pub fn min_support(&self) -> f64 {
        self.min_support
    }

    pub fn itemsets(&self) -> &[Itemset] {
        &self.itemsets
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Itemset> {
        self.itemsets.iter()
    }

    pub fn len(&self) -> usize {
        self.itemsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.itemsets.is_empty()
    }

    /// Size of the largest itemset, 0 when empty
    pub fn max_size(&self) -> usize {
        self.itemsets.iter().map(Itemset::len).max().unwrap_or(0)
    }

    pub fn of_size(&self, k: usize) -> impl Iterator<Item = &Itemset> {
        self.itemsets.iter().filter(move |s| s.len() == k)
    }

    /// Support keyed by the sorted item list
    pub fn support_table(&self) -> HashMap<&[String], f64> {
        self.itemsets
            .iter()
            .map(|s| (s.items.as_slice(), s.support))
            .collect()
    }

    /// Support of an itemset given in any order, if it is frequent
    pub fn support_of<S: AsRef<str>>(&self, items: &[S]) -> Option<f64> {
        let mut key: Vec<&str> = items.iter().map(AsRef::as_ref).collect();
        key.sort_unstable();
        key.dedup();
        self.itemsets
            .iter()
            .find(|s| s.items.iter().map(String::as_str).eq(key.iter().copied()))
            .map(Itemset::support)
    }
}

impl<'a> IntoIterator for &'a FrequentItemsets {
    type Item = &'a Itemset;
    type IntoIter = std::slice::Iter<'a, Itemset>;

    fn into_iter(self) -> Self::IntoIter {
        self.itemsets.iter()
    }
}

/// A candidate or frequent itemset as sorted column indices
type Level = Vec<(Vec<usize>, usize)>;

/// Mine all itemsets whose support meets `options.min_support`.
///
/// Returns an empty collection when nothing is frequent. Fails only on an
/// out-of-range threshold or a passed deadline, never with partial output.
pub fn mine_frequent_itemsets(
    matrix: &OccurrenceMatrix,
    options: &MiningOptions,
) -> MiningResult<FrequentItemsets> {
    check_range("support", options.min_support, 0.0, 1.0, "[0, 1]")?;

    let n_transactions = matrix.n_transactions();
    let min_support = options.min_support;
    let max_len = options.max_len.unwrap_or(usize::MAX);
    let mut found: Level = Vec::new();

    if n_transactions > 0 && max_len > 0 {
        let is_frequent = |count: usize| {
            count > 0 && count as f64 / n_transactions as f64 + SUPPORT_EPSILON >= min_support
        };

        // Level 1: column sums
        let mut current: Level = (0..matrix.n_items())
            .map(|c| (vec![c], matrix.column(c).iter().filter(|&&v| v).count()))
            .filter(|(_, count)| is_frequent(*count))
            .collect();
        debug!(level = 1, frequent = current.len(), "mined itemset level");

        let mut k = 1;
        while !current.is_empty() {
            check_deadline(options.deadline, k)?;
            if k >= max_len {
                found.append(&mut current);
                break;
            }

            let candidates = generate_candidates(&current);
            found.append(&mut current);
            if candidates.is_empty() {
                break;
            }

            k += 1;
            let n_candidates = candidates.len();
            current = candidates
                .into_iter()
                .map(|cand| {
                    let count = matrix.count_containing(&cand);
                    (cand, count)
                })
                .filter(|(_, count)| is_frequent(*count))
                .collect();
            debug!(
                level = k,
                candidates = n_candidates,
                frequent = current.len(),
                "mined itemset level"
            );
        }
    }

    let mut itemsets: Vec<Itemset> = found
        .into_iter()
        .map(|(columns, count)| Itemset {
            items: columns.iter().map(|&c| matrix.items()[c].clone()).collect(),
            count,
            support: count as f64 / n_transactions as f64,
        })
        .collect();
    itemsets.sort_by(compare_itemsets);

    Ok(FrequentItemsets {
        n_transactions,
        min_support,
        itemsets,
    })
}

fn check_deadline(deadline: Option<Instant>, completed_level: usize) -> MiningResult<()> {
    match deadline {
        Some(deadline) if Instant::now() >= deadline => {
            Err(MiningError::DeadlineExceeded { completed_level })
        }
        _ => Ok(()),
    }
}

/// Join frequent (k-1)-itemsets sharing a (k-2)-prefix and prune any
/// candidate with an infrequent (k-1)-subset.
///
/// `prev` must be sorted lexicographically by column indices, which keeps
/// itemsets with a common prefix adjacent.
fn generate_candidates(prev: &Level) -> Vec<Vec<usize>> {
    let frequent: HashSet<&[usize]> = prev.iter().map(|(cols, _)| cols.as_slice()).collect();
    let mut candidates = Vec::new();

    for (i, (left, _)) in prev.iter().enumerate() {
        let prefix_len = left.len() - 1;
        for (right, _) in &prev[i + 1..] {
            if left[..prefix_len] != right[..prefix_len] {
                break;
            }

            let mut candidate = left.clone();
            candidate.push(right[prefix_len]);

            if !has_infrequent_subset(&candidate, &frequent) {
                candidates.push(candidate);
            }
        }
    }

    candidates
}

fn has_infrequent_subset(candidate: &[usize], frequent: &HashSet<&[usize]>) -> bool {
    let k = candidate.len();
    // Dropping either of the last two items yields one of the joined parents
    (0..k.saturating_sub(2)).any(|skip| {
        let subset: Vec<usize> = candidate
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != skip)
            .map(|(_, &c)| c)
            .collect();
        !frequent.contains(subset.as_slice())
    })
}

fn compare_itemsets(a: &Itemset, b: &Itemset) -> Ordering {
    a.len()
        .cmp(&b.len())
        .then_with(|| b.count.cmp(&a.count))
        .then_with(|| a.items.cmp(&b.items))
}
