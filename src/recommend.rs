//! Ingredient recommendations from association rules

use crate::encoder::normalize_item;
use crate::rules::AssociationRule;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An ingredient suggested by one or more matching rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub item: String,
    /// Highest lift among rules recommending this item
    pub lift: f64,
    /// Highest confidence among rules recommending this item
    pub confidence: f64,
    /// Number of matching rules with this item in the consequent
    pub rule_count: usize,
}

/// Normalize a user's ingredient selection the same way records are encoded
pub fn normalize_selection<S: AsRef<str>>(selected: &[S]) -> BTreeSet<String> {
    selected
        .iter()
        .filter_map(|s| normalize_item(s.as_ref()))
        .collect()
}

/// Rules whose antecedent is contained in `selection`, in their original order.
///
/// Membership is exact item equality; "acid" never matches "hyaluronic acid".
/// An empty selection matches nothing.
pub fn matching_rules<'a>(
    selection: &BTreeSet<String>,
    rules: &'a [AssociationRule],
) -> Vec<&'a AssociationRule> {
    if selection.is_empty() {
        return Vec::new();
    }
    rules
        .iter()
        .filter(|rule| rule.antecedent_within(|item| selection.contains(item)))
        .collect()
}

/// Rank consequent items of every matching rule, excluding already selected items.
///
/// Ordered by max lift, then max confidence, then item name.
pub fn recommend(selection: &BTreeSet<String>, rules: &[AssociationRule]) -> Vec<Recommendation> {
    let mut by_item: BTreeMap<&str, Recommendation> = BTreeMap::new();

    for rule in matching_rules(selection, rules) {
        for item in rule.consequent.iter().filter(|i| !selection.contains(*i)) {
            let entry = by_item.entry(item.as_str()).or_insert_with(|| Recommendation {
                item: item.clone(),
                lift: rule.lift,
                confidence: rule.confidence,
                rule_count: 0,
            });
            entry.lift = entry.lift.max(rule.lift);
            entry.confidence = entry.confidence.max(rule.confidence);
            entry.rule_count += 1;
        }
    }

    let mut ranked: Vec<Recommendation> = by_item.into_values().collect();
    ranked.sort_by(|a, b| {
        b.lift
            .total_cmp(&a.lift)
            .then_with(|| b.confidence.total_cmp(&a.confidence))
            .then_with(|| a.item.cmp(&b.item))
    });
    ranked
}
