use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use toolbox_core::Category;
use tracing::info;

use crate::common;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct CategorySummary {
    pub index: usize,
    pub name: Option<String>,
    pub colour: Option<String>,
    pub custom: Option<String>,
    pub blocks: usize,
    /// Distinct block types reachable from the category, first-seen order.
    pub types: Vec<String>,
}

pub fn summarize(categories: &[Category]) -> Vec<CategorySummary> {
    categories
        .iter()
        .enumerate()
        .map(|(index, category)| {
            let mut types: Vec<String> = Vec::new();
            for block in category.blocks() {
                block.visit(&mut |b| {
                    if !types.iter().any(|t| *t == b.block_type) {
                        types.push(b.block_type.clone());
                    }
                });
            }
            CategorySummary {
                index,
                name: category.name.clone(),
                colour: category.colour.clone(),
                custom: category.custom.clone(),
                blocks: category.blocks().len(),
                types,
            }
        })
        .collect()
}

pub fn run(input: &Path, json: bool) -> Result<()> {
    let text = common::read_input(input)?;
    let categories = toolbox_core::parse_toolbox(&text)
        .with_context(|| format!("normalize toolbox {}", input.display()))?;
    let summaries = summarize(&categories);
    info!(categories = summaries.len(), "summarized toolbox");

    if json {
        return common::print_json(&summaries, false);
    }

    println!(
        "{:<6} {:<20} {:<10} {:<7} {}",
        "INDEX", "Name", "Colour", "Blocks", "Types"
    );
    for summary in &summaries {
        let types = match (&summary.custom, summary.types.is_empty()) {
            (Some(custom), true) => format!("<{custom}>"),
            _ => summary.types.join(","),
        };
        println!(
            "{:<6} {:<20} {:<10} {:<7} {}",
            summary.index,
            summary.name.as_deref().unwrap_or("-"),
            summary.colour.as_deref().unwrap_or("-"),
            summary.blocks,
            types,
        );
    }

    Ok(())
}
