//! Terminal styling utilities for CLI output

use std::time::Duration;

use console::{style, Emoji};

// Emoji icons with fallbacks for terminals that don't support them
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[*] ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", ">> ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

/// Print the application banner
pub fn print_banner(version: &str) {
    let banner = r#"
     ___ _ __ ___  __| |___  ___ ___  _ __ ___
    / __| '__/ _ \/ _` / __|/ __/ _ \| '__/ _ \
   | (__| | |  __/ (_| \__ \ (_| (_) | | |  __/
    \___|_|  \___|\__,_|___/\___\___/|_|  \___|
    "#;

    println!();
    println!("{}", style(banner).cyan().bold());
    println!(
        "    {}",
        style("Multi-value encoding and credit scoring").dim()
    );
    println!("    {}", style(format!("v{}", version)).dim());
    println!("    {}", style("━".repeat(50)).dim());
    println!();
}

/// Print a configuration card of label/value pairs
pub fn print_config(title: &str, entries: &[(&str, String)]) {
    let label_width = entries.iter().map(|(l, _)| l.len()).max().unwrap_or(0);

    println!("    {}", style(format!("⚙️  {}", title)).cyan().bold());
    println!("    {}", style("─".repeat(50)).dim());
    for (label, value) in entries {
        println!(
            "      {}  {}",
            style(format!("{:<width$}", label, width = label_width)).dim(),
            style(truncate_string(value, 60)).yellow()
        );
    }
    println!();
}

/// Print a step header with styling
pub fn print_step_header(step_num: u8, title: &str) {
    println!();
    println!(
        "    {} {} {}",
        style(format!("STEP {}", step_num)).cyan().bold(),
        style("│").dim(),
        style(title).white().bold()
    );
    println!("    {}", style("─".repeat(50)).dim());
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("    {} {}", style("✓").green().bold(), style(message).green());
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("    {} {}", INFO, message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("    {} {}", WARN, style(message).yellow());
}

/// Print elapsed time for a step
pub fn print_step_time(elapsed: Duration) {
    println!(
        "      {}",
        style(format!("({:.2}s)", elapsed.as_secs_f64())).dim()
    );
}

/// Print the final completion message
pub fn print_completion(message: &str) {
    println!();
    println!("    {} {}", ROCKET, style(message).green().bold());
    println!();
}

/// Print a styled count message
pub fn print_count(description: &str, count: usize) {
    println!("      Found {} {}", style(count).yellow().bold(), description);
}

pub fn truncate_string(s: &str, max_len: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        ".".repeat(max_len)
    } else {
        let tail: String = chars[chars.len() - (max_len - 3)..].iter().collect();
        format!("...{}", tail)
    }
}
