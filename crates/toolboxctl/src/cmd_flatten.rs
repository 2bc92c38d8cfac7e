use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::common;

pub fn run(input: &Path, compact: bool) -> Result<()> {
    let text = common::read_input(input)?;
    let document = toolbox_xml::parse_and_flatten(&text)
        .with_context(|| format!("flatten {}", input.display()))?;
    info!(keys = document.len(), "flattened document");
    common::print_json(&document, compact)
}
