use mdyoink_core::{BudgetLevel, ExtractionResult, TokenBudget};
use owo_colors::OwoColorize;

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "mdyoink".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Yoink pages into Markdown\n".dimmed());
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

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print timing information with color coding
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let ms = duration.as_secs_f64() * 1000.0;
    let label = format!("{}:", label);

    if ms < 50.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "fast".dimmed());
    } else if ms < 100.0 {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}ms ({})", label.dimmed(), ms, "slow".bright_red());
    }
}

/// Print which source the content came from and what was learned about it
pub fn print_extraction_details(result: &ExtractionResult) {
    let source = if result.is_transcript() {
        "video transcript"
    } else if result.has_selection && result.selection.is_some() {
        "selection"
    } else if result.used_selector == Some(true) {
        "domain selector"
    } else {
        "page"
    };

    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Extraction Details".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Source:".dimmed(), source.bright_white());
    if !result.title.is_empty() {
        eprintln!("  {} {}", "Title:".dimmed(), result.title.bright_white());
    }
    if !result.byline.is_empty() {
        eprintln!("  {} {}", "Byline:".dimmed(), result.byline.bright_white());
    }
    if let Some(segments) = &result.segments {
        eprintln!("  {} {}", "Segments:".dimmed(), segments.len().to_string().bright_white());
    } else {
        eprintln!("  {} {}", "Length:".dimmed(), result.length.to_string().bright_white());
    }
    eprintln!();
}

/// Print the token estimate against the configured model's context window
pub fn print_token_budget(model: &str, budget: &TokenBudget) {
    let usage = format!("{:.1}%", budget.percentage);
    let usage = match budget.level {
        BudgetLevel::Ok => usage.green().to_string(),
        BudgetLevel::Warn => usage.yellow().to_string(),
        BudgetLevel::High => usage.red().to_string(),
    };

    eprintln!(
        "  {} ~{} tokens, {} of {} ({} tokens)",
        "Tokens:".dimmed(),
        budget.tokens.to_string().bright_white(),
        usage,
        model.bright_white(),
        budget.context
    );
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
