//! Terminal styling for CLI messages and text reports.

use colored::Colorize;
use std::io::{self, IsTerminal};

/// Print an error message to stderr
pub fn error(msg: &str) {
    eprintln!("{} {}", "error:".red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", "warning:".yellow().bold(), msg);
}

pub fn success(msg: &str) {
    println!("{} {}", "✓".green().bold(), msg);
}

/// Print a hint message to stderr (dimmed)
pub fn hint(msg: &str) {
    eprintln!("{} {}", "hint:".dimmed(), msg.dimmed());
}

pub fn path(p: &std::path::Path) -> String {
    p.display().to_string().bright_white().to_string()
}

pub fn url(u: &str) -> String {
    u.bright_blue().underline().to_string()
}

/// Bold section title for text reports.
pub fn heading(title: &str) -> String {
    title.cyan().bold().to_string()
}

/// One validation problem, as a bulleted line.
pub fn problem(msg: &str) -> String {
    format!("  {} {}", "•".red(), msg)
}

pub fn is_terminal() -> bool {
    io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_survives_styling() {
        colored::control::set_override(false);
        assert_eq!(problem("bad edge"), "  • bad edge");
        assert_eq!(heading("Sankey"), "Sankey");
        colored::control::unset_override();
    }
}
