//! CLI module

mod commands;
mod output;

pub use commands::Cli;
pub use output::{TOKEN_INVALID, TOKEN_UNKNOWN, batch_line, report_json, token};
