use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::common;

pub fn run(input: &Path, compact: bool) -> Result<()> {
    let text = common::read_input(input)?;
    let categories = toolbox_core::parse_toolbox(&text)
        .with_context(|| format!("normalize toolbox {}", input.display()))?;
    info!(categories = categories.len(), "parsed toolbox");
    common::print_json(&categories, compact)
}
