use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "Pagesift".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Measure visible and main-content text on rendered pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message.bright_red());
}

/// Print the result table header
pub fn print_table_header() {
    println!(
        "{:<52} {:>8} {:>9} {:>7}",
        "URL".bold(),
        "TOTAL".bold(),
        "CONTENT".bold(),
        "RATIO".bold()
    );
    println!("{}", "─".repeat(80).dimmed());
}

/// Print one successful row of the result table
pub fn print_table_row(url: &str, total: usize, content: usize) {
    let ratio = if total > 0 { content as f64 / total as f64 * 100.0 } else { 0.0 };
    println!(
        "{:<52} {:>8} {:>9} {:>6.1}%",
        truncate_url(url, 52),
        total,
        content.bright_white(),
        ratio
    );
}

/// Print one failed row of the result table
pub fn print_table_error(url: &str, error: &str) {
    println!("{:<52} {}", truncate_url(url, 52), error.bright_red());
}

/// Shorten a URL for table display, keeping the tail readable
fn truncate_url(url: &str, max: usize) -> String {
    if url.chars().count() <= max {
        return url.to_string();
    }
    let tail: String = url.chars().rev().take(max - 1).collect::<Vec<_>>().into_iter().rev().collect();
    format!("…{}", tail)
}
