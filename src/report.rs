//! Console tables for mining results

use crate::catalog::ProductRecord;
use crate::pipeline::MiningOutput;
use crate::recommend::Recommendation;
use crate::rules::AssociationRule;

/// Truncate long ingredient lists so table columns stay readable
fn clip(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Print dataset and result sizes
pub fn print_mining_summary(n_products: usize, output: &MiningOutput) {
    println!("\n=== Mining Summary ===");
    println!("Products analysed: {}", n_products);
    println!("Distinct ingredients: {}", output.items.len());
    println!(
        "Frequent itemsets: {} (min support {:.2}, largest size {})",
        output.itemsets.len(),
        output.params.min_support,
        output.itemsets.max_size()
    );
    println!(
        "Association rules: {} (min {} {:.2})",
        output.rules.len(),
        output.params.metric,
        output.params.min_confidence
    );
}

/// Print up to `limit` rules in their ranked order
pub fn print_rules<'a, I>(title: &str, rules: I, limit: usize)
where
    I: IntoIterator<Item = &'a AssociationRule>,
{
    println!("\n=== {} ===", title);
    println!(
        "  {:<40} | {:<30} | {:>7} | {:>10} | {:>6}",
        "Antecedent", "Consequent", "Support", "Confidence", "Lift"
    );
    println!("  {}", "-".repeat(105));
    for rule in rules.into_iter().take(limit) {
        println!(
            "  {:<40} | {:<30} | {:>7.3} | {:>10.3} | {:>6.3}",
            clip(&rule.antecedent_text(), 40),
            clip(&rule.consequent_text(), 30),
            rule.support,
            rule.confidence,
            rule.lift
        );
    }
}

pub fn print_recommendations(recommendations: &[Recommendation], limit: usize) {
    println!("\n=== Recommended Ingredients ===");
    println!("  {:<40} | {:>6} | {:>10} | {:>5}", "Ingredient", "Lift", "Confidence", "Rules");
    println!("  {}", "-".repeat(70));
    for rec in recommendations.iter().take(limit) {
        println!(
            "  {:<40} | {:>6.3} | {:>10.3} | {:>5}",
            clip(&rec.item, 40),
            rec.lift,
            rec.confidence,
            rec.rule_count
        );
    }
}

pub fn print_products(title: &str, products: &[&ProductRecord], limit: usize) {
    println!("\n{}", title);
    for product in products.iter().take(limit) {
        match &product.category {
            Some(category) => println!("  - {} ({})", product.display_name(), category),
            None => println!("  - {}", product.display_name()),
        }
    }
    if products.len() > limit {
        println!("  ... and {} more", products.len() - limit);
    }
}
