//! Association rule generation from frequent itemsets

use crate::error::{check_range, MiningError, MiningResult};
use crate::miner::{FrequentItemsets, SUPPORT_EPSILON};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io::Write;
use std::str::FromStr;
use tracing::debug;

/// Separator used when an itemset is flattened to a single text cell
pub const ITEM_JOIN: &str = ", ";

/// Header of the flat rule export
pub const EXPORT_COLUMNS: [&str; 5] = ["antecedent", "consequent", "support", "confidence", "lift"];

/// Largest itemset whose splits can be enumerated with a `u64` mask
pub const MAX_RULE_ITEMSET_LEN: usize = 63;

/// Metric used to decide whether a rule is kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMetric {
    #[default]
    Confidence,
    Lift,
    Support,
    Leverage,
}

impl RuleMetric {
    /// Reject thresholds the metric can never take
    pub(crate) fn validate(self, threshold: f64) -> MiningResult<()> {
        match self {
            Self::Confidence => check_range("confidence", threshold, 0.0, 1.0, "[0, 1]"),
            Self::Support => check_range("support", threshold, 0.0, 1.0, "[0, 1]"),
            Self::Lift => check_range("lift", threshold, 0.0, f64::INFINITY, "[0, inf)"),
            Self::Leverage => check_range("leverage", threshold, -1.0, 1.0, "[-1, 1]"),
        }
    }

    fn value(self, rule: &AssociationRule) -> f64 {
        match self {
            Self::Confidence => rule.confidence,
            Self::Lift => rule.lift,
            Self::Support => rule.support,
            Self::Leverage => rule.leverage,
        }
    }
}

impl fmt::Display for RuleMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Confidence => "confidence",
            Self::Lift => "lift",
            Self::Support => "support",
            Self::Leverage => "leverage",
        };
        f.write_str(name)
    }
}

impl FromStr for RuleMetric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confidence" => Ok(Self::Confidence),
            "lift" => Ok(Self::Lift),
            "support" => Ok(Self::Support),
            "leverage" => Ok(Self::Leverage),
            other => anyhow::bail!("Unknown rule metric: {}", other),
        }
    }
}

/// Rule gating parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleOptions {
    pub metric: RuleMetric,
    pub min_threshold: f64,
    /// Keep only the first `top_n` rules after ordering
    pub top_n: Option<usize>,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            metric: RuleMetric::Confidence,
            min_threshold: 0.5,
            top_n: None,
        }
    }
}

impl RuleOptions {
    pub fn confidence(min_confidence: f64) -> Self {
        Self {
            min_threshold: min_confidence,
            ..Self::default()
        }
    }
}

/// Association rule: antecedent => consequent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    /// Left side items, sorted
    pub antecedent: Vec<String>,
    /// Right side items, sorted
    pub consequent: Vec<String>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of antecedent ∪ consequent
    pub support: f64,
    /// support / antecedent_support
    pub confidence: f64,
    /// confidence / consequent_support
    pub lift: f64,
    /// support - antecedent_support * consequent_support
    pub leverage: f64,
}

impl AssociationRule {
    pub fn antecedent_text(&self) -> String {
        self.antecedent.join(ITEM_JOIN)
    }

    pub fn consequent_text(&self) -> String {
        self.consequent.join(ITEM_JOIN)
    }

    /// Every antecedent item satisfies `contains`
    pub fn antecedent_within<F: Fn(&str) -> bool>(&self, contains: F) -> bool {
        self.antecedent.iter().all(|item| contains(item))
    }
}

impl fmt::Display for AssociationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}}} => {{{}}} (support={:.3}, confidence={:.3}, lift={:.3})",
            self.antecedent_text(),
            self.consequent_text(),
            self.support,
            self.confidence,
            self.lift
        )
    }
}

/// Generate every rule derivable from `itemsets` that passes `options`.
///
/// Antecedent and consequent supports come from the itemset table; frequent
/// itemsets are closed under subsets so the lookups always succeed for mined
/// input. An empty result is a valid outcome.
pub fn generate_rules(
    itemsets: &FrequentItemsets,
    options: &RuleOptions,
) -> MiningResult<Vec<AssociationRule>> {
    options.metric.validate(options.min_threshold)?;

    let supports = itemsets.support_table();
    let mut rules = Vec::new();

    for itemset in itemsets.iter().filter(|s| s.len() >= 2) {
        let items = itemset.items();
        let n = items.len();
        let full_mask = u32::try_from(n)
            .ok()
            .and_then(|shift| 1u64.checked_shl(shift))
            .ok_or(MiningError::ItemsetTooLarge {
                size: n,
                max: MAX_RULE_ITEMSET_LEN,
            })?;

        // Masks 1..2^n - 1 cover every non-empty proper subset
        for mask in 1..full_mask - 1 {
            let (antecedent, consequent): (Vec<_>, Vec<_>) = items
                .iter()
                .enumerate()
                .partition(|&(i, _)| mask & (1u64 << i) != 0);
            let antecedent: Vec<String> = antecedent.into_iter().map(|(_, s)| s.clone()).collect();
            let consequent: Vec<String> = consequent.into_iter().map(|(_, s)| s.clone()).collect();

            let (Some(&antecedent_support), Some(&consequent_support)) = (
                supports.get(antecedent.as_slice()),
                supports.get(consequent.as_slice()),
            ) else {
                debug!(
                    itemset = %items.join(ITEM_JOIN),
                    "skipping split with unmined subset"
                );
                continue;
            };

            let support = itemset.support();
            let confidence = support / antecedent_support;
            let rule = AssociationRule {
                antecedent,
                consequent,
                antecedent_support,
                consequent_support,
                support,
                confidence,
                lift: confidence / consequent_support,
                leverage: support - antecedent_support * consequent_support,
            };

            if options.metric.value(&rule) + SUPPORT_EPSILON >= options.min_threshold {
                rules.push(rule);
            }
        }
    }

    rules.sort_by(compare_rules);
    if let Some(top_n) = options.top_n {
        rules.truncate(top_n);
    }

    debug!(
        rules = rules.len(),
        metric = %options.metric,
        threshold = options.min_threshold,
        "generated association rules"
    );
    Ok(rules)
}

/// Descending lift, then descending confidence, then item names
pub fn compare_rules(a: &AssociationRule, b: &AssociationRule) -> Ordering {
    b.lift
        .total_cmp(&a.lift)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.consequent.cmp(&b.consequent))
}

/// Flat row of the rule export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub antecedent: String,
    pub consequent: String,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
}

impl From<&AssociationRule> for RuleRecord {
    fn from(rule: &AssociationRule) -> Self {
        Self {
            antecedent: rule.antecedent_text(),
            consequent: rule.consequent_text(),
            support: rule.support,
            confidence: rule.confidence,
            lift: rule.lift,
        }
    }
}

/// Write rules as CSV with the columns in [`EXPORT_COLUMNS`]
pub fn write_rules_csv<W: Write>(rules: &[AssociationRule], writer: W) -> crate::Result<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    if rules.is_empty() {
        // serde only emits the header alongside the first row
        csv_writer.write_record(EXPORT_COLUMNS)?;
    }
    for rule in rules {
        csv_writer.serialize(RuleRecord::from(rule))?;
    }
    csv_writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::TransactionEncoder;
    use crate::miner::{mine_frequent_itemsets, MiningOptions};
    use approx::assert_relative_eq;

    fn example_itemsets(min_support: f64) -> FrequentItemsets {
        let matrix = TransactionEncoder::default().encode(&["a, b", "a, b, c", "a", "b, c"]);
        mine_frequent_itemsets(&matrix, &MiningOptions::new(min_support)).unwrap()
    }

    fn find<'a>(rules: &'a [AssociationRule], ante: &[&str], cons: &[&str]) -> &'a AssociationRule {
        rules
            .iter()
            .find(|r| r.antecedent == ante && r.consequent == cons)
            .expect("rule should exist")
    }

    #[test]
    fn test_confidence_and_lift() {
        let rules = generate_rules(&example_itemsets(0.5), &RuleOptions::confidence(0.0)).unwrap();

        let rule = find(&rules, &["a"], &["b"]);
        assert_relative_eq!(rule.support, 0.5);
        assert_relative_eq!(rule.confidence, 0.5 / 0.75, epsilon = 1e-9);
        assert_relative_eq!(rule.lift, (0.5 / 0.75) / 0.75, epsilon = 1e-9);
        assert_relative_eq!(rule.leverage, 0.5 - 0.75 * 0.75, epsilon = 1e-9);

        // c => b holds in every transaction with c
        let rule = find(&rules, &["c"], &["b"]);
        assert_relative_eq!(rule.confidence, 1.0);
        assert_eq!(rules.len(), 4);
    }

    #[test]
    fn test_rules_ordering() {
        let rules = generate_rules(&example_itemsets(0.25), &RuleOptions::confidence(0.0)).unwrap();
        for pair in rules.windows(2) {
            assert_ne!(compare_rules(&pair[0], &pair[1]), Ordering::Greater);
        }
        // {a,b,c} yields 6 splits, three pairs yield 2 each
        assert_eq!(rules.len(), 12);
    }

    #[test]
    fn test_min_confidence_filter() {
        let rules = generate_rules(&example_itemsets(0.5), &RuleOptions::confidence(0.8)).unwrap();
        assert!(rules.iter().all(|r| r.confidence >= 0.8));
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].antecedent, vec!["c"]);
    }

    #[test]
    fn test_lift_metric_and_top_n() {
        let options = RuleOptions {
            metric: RuleMetric::Lift,
            min_threshold: 1.0,
            top_n: None,
        };
        let rules = generate_rules(&example_itemsets(0.5), &options).unwrap();
        assert!(rules.iter().all(|r| r.lift >= 1.0));
        assert_eq!(rules.len(), 2);

        let options = RuleOptions {
            top_n: Some(1),
            ..options
        };
        let rules = generate_rules(&example_itemsets(0.5), &options).unwrap();
        assert_eq!(rules.len(), 1);
    }

    #[test]
    fn test_support_metric_gates_rules() {
        let options = RuleOptions {
            metric: RuleMetric::Support,
            min_threshold: 0.5,
            top_n: None,
        };
        let rules = generate_rules(&example_itemsets(0.5), &options).unwrap();
        assert_eq!(rules.len(), 4);

        // Other metrics are still computed for support-gated rules
        let rule = find(&rules, &["b"], &["c"]);
        assert_relative_eq!(rule.support, 0.5);
        assert_relative_eq!(rule.confidence, 0.5 / 0.75, epsilon = 1e-9);
        assert_relative_eq!(rule.lift, (0.5 / 0.75) / 0.5, epsilon = 1e-9);
        assert_relative_eq!(rule.leverage, 0.125, epsilon = 1e-9);

        let options = RuleOptions {
            min_threshold: 0.6,
            ..options
        };
        assert!(generate_rules(&example_itemsets(0.5), &options).unwrap().is_empty());
    }

    #[test]
    fn test_leverage_metric_gates_rules() {
        let options = RuleOptions {
            metric: RuleMetric::Leverage,
            min_threshold: 0.0,
            top_n: None,
        };
        let rules = generate_rules(&example_itemsets(0.5), &options).unwrap();
        assert_eq!(rules.len(), 2);
        assert!(rules.iter().all(|r| r.leverage >= 0.0));
        let rule = find(&rules, &["c"], &["b"]);
        assert_relative_eq!(rule.leverage, 0.125, epsilon = 1e-9);
        assert_relative_eq!(rule.confidence, 1.0);
        assert_relative_eq!(rule.lift, 1.0 / 0.75, epsilon = 1e-9);

        // a and b co-occur less than chance, so only a negative threshold keeps them
        let options = RuleOptions {
            min_threshold: -0.1,
            ..options
        };
        let rules = generate_rules(&example_itemsets(0.5), &options).unwrap();
        assert_eq!(rules.len(), 4);
        let rule = find(&rules, &["a"], &["b"]);
        assert_relative_eq!(rule.leverage, -0.0625, epsilon = 1e-9);
        assert_relative_eq!(rule.confidence, 0.5 / 0.75, epsilon = 1e-9);

        let options = RuleOptions {
            min_threshold: -1.5,
            ..options
        };
        assert!(matches!(
            generate_rules(&example_itemsets(0.5), &options),
            Err(MiningError::InvalidThreshold { name: "leverage", .. })
        ));
    }

    #[test]
    fn test_oversized_itemset_is_rejected() {
        let items: Vec<String> = (0..64).map(|i| format!("item{:02}", i)).collect();
        let itemsets: FrequentItemsets = serde_json::from_value(serde_json::json!({
            "n_transactions": 1,
            "min_support": 1.0,
            "itemsets": [{ "items": items, "count": 1, "support": 1.0 }],
        }))
        .unwrap();

        let result = generate_rules(&itemsets, &RuleOptions::confidence(0.0));
        assert_eq!(
            result.unwrap_err(),
            MiningError::ItemsetTooLarge {
                size: 64,
                max: MAX_RULE_ITEMSET_LEN,
            }
        );
    }

    #[test]
    fn test_empty_result_is_not_error() {
        let itemsets = example_itemsets(0.75);
        let rules = generate_rules(&itemsets, &RuleOptions::confidence(0.5)).unwrap();
        assert!(rules.is_empty());
    }

    #[test]
    fn test_invalid_thresholds() {
        let itemsets = example_itemsets(0.5);
        assert!(matches!(
            generate_rules(&itemsets, &RuleOptions::confidence(1.2)),
            Err(MiningError::InvalidThreshold { name: "confidence", .. })
        ));
        let options = RuleOptions {
            metric: RuleMetric::Lift,
            min_threshold: -1.0,
            top_n: None,
        };
        assert!(generate_rules(&itemsets, &options).is_err());
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("Lift".parse::<RuleMetric>().unwrap(), RuleMetric::Lift);
        assert_eq!(" confidence ".parse::<RuleMetric>().unwrap(), RuleMetric::Confidence);
        assert!("conviction".parse::<RuleMetric>().is_err());
        assert_eq!(RuleMetric::Leverage.to_string(), "leverage");
    }

    #[test]
    fn test_write_rules_csv() {
        let rule = AssociationRule {
            antecedent: vec!["glycerin".to_string(), "water".to_string()],
            consequent: vec!["niacinamide".to_string()],
            antecedent_support: 0.5,
            consequent_support: 0.25,
            support: 0.25,
            confidence: 0.5,
            lift: 2.0,
            leverage: 0.125,
        };

        let mut buffer = Vec::new();
        write_rules_csv(&[rule], &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert_eq!(
            text,
            "antecedent,consequent,support,confidence,lift\n\"glycerin, water\",niacinamide,0.25,0.5,2.0\n"
        );

        let mut buffer = Vec::new();
        write_rules_csv(&[], &mut buffer).unwrap();
        assert_eq!(
            String::from_utf8(buffer).unwrap(),
            "antecedent,consequent,support,confidence,lift\n"
        );
    }
}
