//! Product catalog loading using Polars
//!
//! The catalog supplies the raw ingredient strings fed to the miner plus
//! display metadata (brand, name, category, skin-type flags). Metadata is
//! only used to pre-select records and to show example products.

use crate::encoder::{OccurrenceMatrix, TransactionEncoder};
use crate::error::{MiningError, MiningResult};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Skin types flagged per product with 0/1 columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SkinType {
    Combination,
    Dry,
    Normal,
    Oily,
    Sensitive,
}

impl SkinType {
    pub const ALL: [SkinType; 5] = [
        SkinType::Combination,
        SkinType::Dry,
        SkinType::Normal,
        SkinType::Oily,
        SkinType::Sensitive,
    ];

    /// Catalog column holding this skin type's flag
    pub fn column_name(self) -> &'static str {
        match self {
            SkinType::Combination => "Combination",
            SkinType::Dry => "Dry",
            SkinType::Normal => "Normal",
            SkinType::Oily => "Oily",
            SkinType::Sensitive => "Sensitive",
        }
    }
}

impl fmt::Display for SkinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for SkinType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkinType::ALL
            .into_iter()
            .find(|t| t.column_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown skin type: {}", s))
    }
}

/// Names of the catalog columns to read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumns {
    pub ingredients: String,
    pub brand: String,
    pub name: String,
    pub category: String,
}

impl Default for CatalogColumns {
    fn default() -> Self {
        Self {
            ingredients: "Ingredients".to_string(),
            brand: "Brand".to_string(),
            name: "Name".to_string(),
            category: "Label".to_string(),
        }
    }
}

/// A single product row
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub brand: Option<String>,
    pub name: Option<String>,
    pub category: Option<String>,
    /// Skin types the product is flagged for
    pub skin_types: Vec<SkinType>,
    /// Raw delimiter-separated ingredient list
    pub ingredients: Option<String>,
}

impl ProductRecord {
    pub fn suits(&self, skin_type: SkinType) -> bool {
        self.skin_types.contains(&skin_type)
    }

    /// "Brand Name", falling back to whichever part is present
    pub fn display_name(&self) -> String {
        match (&self.brand, &self.name) {
            (Some(brand), Some(name)) => format!("{} {}", brand, name),
            (Some(only), None) | (None, Some(only)) => only.clone(),
            (None, None) => "(unnamed product)".to_string(),
        }
    }
}

/// Ordered product records; row order matches the occurrence matrix rows
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductCatalog {
    records: Vec<ProductRecord>,
}

impl ProductCatalog {
    pub fn from_records(records: Vec<ProductRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ProductRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Products flagged for `skin_type`
    pub fn for_skin_type(&self, skin_type: SkinType) -> ProductCatalog {
        ProductCatalog {
            records: self
                .records
                .iter()
                .filter(|r| r.suits(skin_type))
                .cloned()
                .collect(),
        }
    }

    /// Raw ingredient strings, one per record
    pub fn ingredient_lists(&self) -> Vec<Option<&str>> {
        self.records.iter().map(|r| r.ingredients.as_deref()).collect()
    }

    /// Ingredient strings with nulls as empty records, as stored in snapshots.
    ///
    /// Fails when no product carries an ingredient list at all, which can
    /// happen after a skin-type selection even if the full column had values.
    pub fn transactions(&self) -> MiningResult<Vec<String>> {
        if !self.records.is_empty() && self.records.iter().all(|r| r.ingredients.is_none()) {
            return Err(MiningError::Encoding(format!(
                "ingredient list is null in all {} selected products",
                self.records.len()
            )));
        }
        Ok(self
            .records
            .iter()
            .map(|r| r.ingredients.clone().unwrap_or_default())
            .collect())
    }

    /// One-hot encode the ingredient column
    pub fn encode(&self, encoder: &TransactionEncoder) -> MiningResult<OccurrenceMatrix> {
        encoder.encode_column(&self.ingredient_lists())
    }

    /// Products whose ingredient set contains every item in `items`
    pub fn products_containing(
        &self,
        items: &BTreeSet<String>,
        encoder: &TransactionEncoder,
    ) -> Vec<&ProductRecord> {
        self.records
            .iter()
            .filter(|r| {
                let Some(raw) = r.ingredients.as_deref() else {
                    return false;
                };
                let tokens = encoder.tokenize(raw);
                items.is_subset(&tokens)
            })
            .collect()
    }
}

/// Load a product catalog from CSV.
///
/// Every column is read as text. The ingredient column is required; the
/// metadata and skin-type columns are optional.
///
/// # Arguments
/// * `file_path` - Path to the CSV file
/// * `columns` - Column names to read
pub fn load_catalog<P: AsRef<Path>>(file_path: P, columns: &CatalogColumns) -> crate::Result<ProductCatalog> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(file_path.as_ref().to_path_buf()))?
        .finish()?;

    if df.height() == 0 {
        anyhow::bail!("Catalog has no rows");
    }

    catalog_from_frame(&df, columns)
}

/// Convert a loaded DataFrame into product records
fn catalog_from_frame(df: &DataFrame, columns: &CatalogColumns) -> crate::Result<ProductCatalog> {
    let ingredients = string_column(df, &columns.ingredients)?.ok_or_else(|| {
        MiningError::Encoding(format!("missing ingredient column '{}'", columns.ingredients))
    })?;
    if ingredients.iter().all(Option::is_none) {
        return Err(MiningError::Encoding(format!(
            "ingredient column '{}' is empty in every row",
            columns.ingredients
        ))
        .into());
    }

    let n_rows = df.height();
    let brand = string_column(df, &columns.brand)?.unwrap_or_else(|| vec![None; n_rows]);
    let name = string_column(df, &columns.name)?.unwrap_or_else(|| vec![None; n_rows]);
    let category = string_column(df, &columns.category)?.unwrap_or_else(|| vec![None; n_rows]);

    let mut flags: Vec<(SkinType, Vec<Option<String>>)> = Vec::new();
    for skin_type in SkinType::ALL {
        if let Some(values) = string_column(df, skin_type.column_name())? {
            flags.push((skin_type, values));
        }
    }

    let records = (0..n_rows)
        .map(|row| ProductRecord {
            brand: brand[row].clone(),
            name: name[row].clone(),
            category: category[row].clone(),
            skin_types: flags
                .iter()
                .filter(|(_, values)| values[row].as_deref().is_some_and(is_flag_set))
                .map(|(skin_type, _)| *skin_type)
                .collect(),
            ingredients: ingredients[row].clone(),
        })
        .collect();

    Ok(ProductCatalog { records })
}

/// Read a text column, `None` if the column does not exist.
/// Blank cells become nulls.
fn string_column(df: &DataFrame, name: &str) -> crate::Result<Option<Vec<Option<String>>>> {
    let Ok(column) = df.column(name) else {
        return Ok(None);
    };
    let values = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string))
        .collect();
    Ok(Some(values))
}

fn is_flag_set(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "1.0" | "true" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Label,Brand,Name,Price,Rank,Ingredients,Combination,Dry,Normal,Oily,Sensitive").unwrap();
        writeln!(file, "Moisturizer,CeraVe,Daily Lotion,19,4.5,\"Water, Glycerin, Ceramide NP\",1,1,1,0,1").unwrap();
        writeln!(file, "Cleanser,Acme,Foam Wash,12,4.1,\"water, Glycerin, Salicylic Acid\",1,0,0,1,0").unwrap();
        writeln!(file, "Serum,Acme,Glow Drops,30,4.0,,0,1,0,0,0").unwrap();
        file
    }

    #[test]
    fn test_load_catalog() {
        let file = create_test_csv();
        let catalog = load_catalog(file.path(), &CatalogColumns::default()).unwrap();

        assert_eq!(catalog.len(), 3);
        let first = &catalog.records()[0];
        assert_eq!(first.brand.as_deref(), Some("CeraVe"));
        assert_eq!(first.category.as_deref(), Some("Moisturizer"));
        assert_eq!(
            first.skin_types,
            vec![SkinType::Combination, SkinType::Dry, SkinType::Normal, SkinType::Sensitive]
        );
        assert_eq!(catalog.records()[2].ingredients, None);
        assert_eq!(first.display_name(), "CeraVe Daily Lotion");
    }

    #[test]
    fn test_encode_keeps_empty_rows() {
        let file = create_test_csv();
        let catalog = load_catalog(file.path(), &CatalogColumns::default()).unwrap();
        let matrix = catalog.encode(&TransactionEncoder::default()).unwrap();

        assert_eq!(matrix.n_transactions(), 3);
        assert_eq!(
            matrix.items(),
            &["ceramide np", "glycerin", "salicylic acid", "water"]
        );
        assert!(matrix.transaction(2).is_empty());
    }

    #[test]
    fn test_missing_ingredient_column() {
        let file = create_test_csv();
        let columns = CatalogColumns {
            ingredients: "ingredient_list".to_string(),
            ..CatalogColumns::default()
        };
        let err = load_catalog(file.path(), &columns).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MiningError>(),
            Some(MiningError::Encoding(_))
        ));
    }

    #[test]
    fn test_skin_type_filter_and_lookup() {
        let file = create_test_csv();
        let catalog = load_catalog(file.path(), &CatalogColumns::default()).unwrap();

        let oily = catalog.for_skin_type(SkinType::Oily);
        assert_eq!(oily.len(), 1);
        assert_eq!(oily.records()[0].name.as_deref(), Some("Foam Wash"));

        let encoder = TransactionEncoder::default();
        let wanted: BTreeSet<String> = ["glycerin".to_string(), "water".to_string()].into();
        let found = catalog.products_containing(&wanted, &encoder);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_selection_without_ingredients() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Brand,Name,Ingredients,Dry,Oily").unwrap();
        writeln!(file, "Acme,Oil Balm,,1,0").unwrap();
        writeln!(file, "Acme,Rich Cream,,1,0").unwrap();
        writeln!(file, "Clearco,Gel Wash,\"Water, Niacinamide\",0,1").unwrap();

        let catalog = load_catalog(file.path(), &CatalogColumns::default()).unwrap();
        assert_eq!(catalog.transactions().unwrap().len(), 3);

        let dry = catalog.for_skin_type(SkinType::Dry);
        assert_eq!(dry.len(), 2);
        assert!(matches!(dry.transactions(), Err(MiningError::Encoding(_))));
        assert!(matches!(
            dry.encode(&TransactionEncoder::default()),
            Err(MiningError::Encoding(_))
        ));
    }

    #[test]
    fn test_skin_type_parse() {
        assert_eq!("dry".parse::<SkinType>().unwrap(), SkinType::Dry);
        assert_eq!("OILY".parse::<SkinType>().unwrap(), SkinType::Oily);
        assert!("greasy".parse::<SkinType>().is_err());
    }
}
