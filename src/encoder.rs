//! Transaction encoding: raw ingredient strings to a boolean occurrence matrix

use crate::error::{MiningError, MiningResult};
use ndarray::{Array2, ArrayView1};
use std::collections::{BTreeSet, HashMap};

/// Default separator between ingredients in a record
pub const DEFAULT_DELIMITER: char = ',';

/// Normalize a single ingredient token: trim surrounding whitespace and lower-case.
///
/// Returns `None` for tokens that are empty after trimming.
pub fn normalize_item(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}

/// Splits ingredient lists into normalized transactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransactionEncoder {
    delimiter: char,
}

impl Default for TransactionEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_DELIMITER)
    }
}

impl TransactionEncoder {
    pub fn new(delimiter: char) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Split one record into its set of distinct, normalized items
    pub fn tokenize(&self, record: &str) -> BTreeSet<String> {
        record
            .split(self.delimiter)
            .filter_map(normalize_item)
            .collect()
    }

    /// Encode records into an occurrence matrix.
    ///
    /// Never fails: malformed or empty records become all-false rows so the
    /// row count always matches the input.
    pub fn encode<S: AsRef<str>>(&self, records: &[S]) -> OccurrenceMatrix {
        let transactions: Vec<BTreeSet<String>> =
            records.iter().map(|r| self.tokenize(r.as_ref())).collect();
        OccurrenceMatrix::from_transactions(&transactions)
    }

    /// Encode a nullable column of records.
    ///
    /// Null entries become empty transactions. Fails only when the column
    /// holds no value at all in any record.
    pub fn encode_column<S: AsRef<str>>(
        &self,
        records: &[Option<S>],
    ) -> MiningResult<OccurrenceMatrix> {
        if !records.is_empty() && records.iter().all(Option::is_none) {
            return Err(MiningError::Encoding(format!(
                "ingredient column is null in all {} records",
                records.len()
            )));
        }

        let transactions: Vec<BTreeSet<String>> = records
            .iter()
            .map(|r| r.as_ref().map(|s| self.tokenize(s.as_ref())).unwrap_or_default())
            .collect();
        Ok(OccurrenceMatrix::from_transactions(&transactions))
    }
}

/// One-hot view of a transaction list.
///
/// Rows are transactions in input order, columns are distinct items in
/// lexicographic order.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceMatrix {
    items: Vec<String>,
    matrix: Array2<bool>,
}

impl OccurrenceMatrix {
    /// Build from already-normalized transactions
    pub fn from_transactions(transactions: &[BTreeSet<String>]) -> Self {
        let items: Vec<String> = transactions
            .iter()
            .flatten()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let index: HashMap<&str, usize> = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.as_str(), i))
            .collect();

        let mut matrix = Array2::from_elem((transactions.len(), items.len()), false);
        for (row, transaction) in transactions.iter().enumerate() {
            for item in transaction {
                matrix[[row, index[item.as_str()]]] = true;
            }
        }

        Self { items, matrix }
    }

    /// Distinct items, sorted
    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn matrix(&self) -> &Array2<bool> {
        &self.matrix
    }

    pub fn n_transactions(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn n_items(&self) -> usize {
        self.items.len()
    }

    /// Column index of an item, if present
    pub fn item_index(&self, item: &str) -> Option<usize> {
        self.items.binary_search_by(|candidate| candidate.as_str().cmp(item)).ok()
    }

    pub fn column(&self, col: usize) -> ArrayView1<'_, bool> {
        self.matrix.column(col)
    }

    /// Number of transactions containing every listed column
    pub fn count_containing(&self, columns: &[usize]) -> usize {
        self.matrix
            .outer_iter()
            .filter(|row| columns.iter().all(|&c| row[c]))
            .count()
    }

    /// Items present in transaction `row`
    pub fn transaction(&self, row: usize) -> Vec<&str> {
        self.matrix
            .row(row)
            .iter()
            .zip(&self.items)
            .filter(|(present, _)| **present)
            .map(|(_, item)| item.as_str())
            .collect()
    }
}
