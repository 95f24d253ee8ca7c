pub mod format;
pub mod table;

use anyhow::Result;
use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("{} {msg}", "✓".green());
}

pub fn print_error(msg: &str) {
    eprintln!("{} {msg}", "✗".red());
}
