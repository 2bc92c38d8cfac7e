//! Command implementations for the `toolboxctl` binary.

pub mod cmd_flatten;
pub mod cmd_parse;
pub mod cmd_summary;
pub mod common;
