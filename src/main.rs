//! IngredientForge: skincare ingredient co-occurrence CLI
//!
//! This is the main entrypoint that orchestrates catalog loading, mining,
//! recommendation, and export.

use anyhow::{Context, Result};
use clap::Parser;
use ingredientforge::{
    load_catalog, matching_rules, mine_or_reuse, recommend, report, write_rules_csv, Args,
    MiningSnapshot, ProductCatalog,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    let filter = EnvFilter::try_new(args.log_filter()).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    if args.verbose {
        println!("IngredientForge - Skincare Ingredient Co-occurrence Mining");
        println!("==========================================================\n");
    }

    run(&args)
}

fn run(args: &Args) -> Result<()> {
    let start_time = Instant::now();
    let params = args.mining_params()?;

    // Step 1: Load the catalog
    if args.verbose {
        println!("Step 1: Loading catalog");
        println!("  Input file: {}", args.input);
    }
    let catalog = load_selected_products(args)?;
    println!("✓ Catalog loaded: {} products", catalog.len());

    // Step 2: Mine itemsets and rules
    if args.verbose {
        println!("\nStep 2: Mining ingredient patterns");
        println!("  Minimum support: {}", params.min_support);
        println!("  Minimum {}: {}", params.metric, params.min_confidence);
    }
    let cached = args.snapshot.as_deref().and_then(load_snapshot);
    let mine_start = Instant::now();
    let (snapshot, reused) = mine_or_reuse(cached, catalog.transactions()?, &params)?;
    let output = &snapshot.output;

    if reused {
        println!("✓ Reused stored results from snapshot");
    } else {
        println!("✓ Mining complete");
    }
    if args.verbose {
        println!("  Mining time: {:.2}s", mine_start.elapsed().as_secs_f64());
    }
    report::print_mining_summary(catalog.len(), output);

    if !output.has_itemsets() {
        println!("\nNo frequent itemsets found. Try lowering the minimum support.");
        return Ok(());
    }
    if !output.has_rules() {
        println!("\nNo association rules found. Try lowering the minimum {}.", params.metric);
        return Ok(());
    }

    // Step 3: Recommend or show global patterns
    let selection = args.selection();
    if selection.is_empty() {
        report::print_rules("Frequent Ingredient Patterns Across All Products", &output.rules, args.top);
    } else {
        let recommendations = recommend(&selection, &output.rules);
        if recommendations.is_empty() {
            println!(
                "\nNo strong co-occurrence found for the selected ingredients. \
                 Try more ingredients or lower thresholds."
            );
        } else {
            let skin_label = args
                .skin_type
                .map(|t| format!(" for {} skin", t))
                .unwrap_or_default();
            println!("\n✨ Recommendations{} based on your selection:", skin_label);
            report::print_recommendations(&recommendations, args.top);
            report::print_rules(
                "Matching Rules",
                matching_rules(&selection, &output.rules),
                args.top,
            );

            let mut wanted = selection.clone();
            wanted.insert(recommendations[0].item.clone());
            let products = catalog.products_containing(&wanted, &params.encoder());
            report::print_products(
                &format!("Products combining your selection with {}:", recommendations[0].item),
                &products,
                args.top,
            );
        }
    }

    // Step 4: Export and persist
    if let Some(export_path) = &args.export {
        export_rules(&output.rules, export_path)?;
        println!("\nRules exported to: {}", export_path);
    }
    if let Some(snapshot_path) = &args.snapshot {
        if !reused {
            snapshot.save(snapshot_path)?;
            if args.verbose {
                println!("Snapshot saved to: {}", snapshot_path);
            }
        }
    }

    if args.verbose {
        println!("\nTotal processing time: {:.2}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

/// Load the catalog and keep only products for the requested skin type
fn load_selected_products(args: &Args) -> Result<ProductCatalog> {
    let catalog = load_catalog(&args.input, &args.catalog_columns())
        .with_context(|| format!("Failed to load catalog {}", args.input))?;

    let Some(skin_type) = args.skin_type else {
        return Ok(catalog);
    };
    let selected = catalog.for_skin_type(skin_type);
    if selected.is_empty() {
        anyhow::bail!("No products are flagged for {} skin", skin_type);
    }
    Ok(selected)
}

/// A missing or unreadable snapshot just means mining from scratch
fn load_snapshot(path: &str) -> Option<MiningSnapshot> {
    if !Path::new(path).exists() {
        return None;
    }
    match MiningSnapshot::load(path) {
        Ok(snapshot) => Some(snapshot),
        Err(err) => {
            warn!(error = %err, "ignoring unreadable snapshot");
            None
        }
    }
}

fn export_rules(rules: &[ingredientforge::AssociationRule], path: &str) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path))?;
    write_rules_csv(rules, BufWriter::new(file))
}
