use std::fs;
use std::io::{self, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

/// Path argument meaning "read from standard input".
pub const STDIN_PATH: &str = "-";

/// Read toolbox text from a file, or from stdin when `path` is `-`.
pub fn read_input(path: &Path) -> Result<String> {
    let text = if path.as_os_str() == STDIN_PATH {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("read toolbox from stdin")?;
        text
    } else {
        fs::read_to_string(path).with_context(|| format!("read toolbox {}", path.display()))?
    };
    debug!(bytes = text.len(), source = %path.display(), "loaded toolbox text");
    Ok(text)
}

pub fn to_json<T: Serialize>(value: &T, compact: bool) -> Result<String> {
    let text = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    text.context("serialise JSON output")
}

pub fn print_json<T: Serialize>(value: &T, compact: bool) -> Result<()> {
    println!("{}", to_json(value, compact)?);
    Ok(())
}
