//! Terminal output helpers.
//!
//! One visual language for every command: success green, warnings yellow,
//! errors red, headers cyan.

use colored::Colorize;

/// Print an info message.
pub fn info(msg: &str) {
    println!("{} {msg}", "ℹ".blue());
}

/// Print a success message.
pub fn success(msg: &str) {
    println!("{} {msg}", "✓".green());
}

/// Print a warning message.
pub fn warn(msg: &str) {
    println!("{} {msg}", "⚠".yellow());
}

/// Print an error message to stderr.
pub fn error(msg: &str) {
    eprintln!("{} {msg}", "✗".red());
}

/// Print a dim, indented line.
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a top-level header.
pub fn header(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a section title.
pub fn section(title: &str) {
    println!();
    println!("{}", title.bold());
}

/// Print an indented key-value pair.
pub fn kv(key: &str, value: &str) {
    println!("  {}: {value}", key.dimmed());
}

/// Print a numbered plan step.
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {msg}", format!("[{num}/{total}]").blue().bold());
}
