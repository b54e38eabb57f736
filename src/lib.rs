//! IngredientForge: frequent ingredient co-occurrence mining for skincare catalogs
//!
//! Ingredient lists are encoded into a one-hot occurrence matrix, frequent
//! itemsets are mined with Apriori, association rules are derived from
//! them, and rules whose antecedent matches a user's ingredients are turned
//! into ranked recommendations.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod encoder;
pub mod error;
pub mod miner;
pub mod pipeline;
pub mod recommend;
pub mod report;
pub mod rules;
pub mod snapshot;

// Re-export public items for easier access
pub use catalog::{load_catalog, CatalogColumns, ProductCatalog, ProductRecord, SkinType};
pub use cli::Args;
pub use config::MiningParams;
pub use encoder::{normalize_item, OccurrenceMatrix, TransactionEncoder};
pub use error::{MiningError, MiningResult};
pub use miner::{mine_frequent_itemsets, FrequentItemsets, Itemset, MiningOptions};
pub use pipeline::{mine, mine_matrix, mine_until, MiningOutput};
pub use recommend::{matching_rules, normalize_selection, recommend, Recommendation};
pub use rules::{generate_rules, write_rules_csv, AssociationRule, RuleMetric, RuleOptions};
pub use snapshot::{mine_or_reuse, MiningSnapshot};

/// Common result type used at the application boundary
pub type Result<T> = anyhow::Result<T>;
