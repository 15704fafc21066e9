//! Console output helpers

use colored::*;
use serde::Serialize;

/// Output format for commands that print a result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON document
    Json,
}

/// Print a value as pretty JSON
pub fn print_json<T: Serialize>(data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(data)?);
    Ok(())
}

/// Print an indented detail line
pub fn print_detail(message: &str) {
    println!("    {}", message);
}

/// Print a passing verdict
pub fn print_success(message: &str) {
    println!("{} {}", "=>".green(), message);
}

/// Print a failing verdict
pub fn print_failure(message: &str) {
    println!("{} {}", "=>".red(), message);
}

/// Print a tool warning line
pub fn print_tool_warning(line: &str) {
    println!("    {}", line.yellow());
}

/// Print a tool error line
pub fn print_tool_error(line: &str) {
    println!("    {}", line.red());
}
