//! Terminal output.
//!
//! With `--json` only machine-readable documents reach stdout; every
//! human-oriented line is suppressed.

use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    fn human(&self) -> bool {
        !self.json
    }

    pub fn info(&self, msg: &str) {
        if self.human() {
            println!("{} {}", style("ℹ").blue(), msg);
        }
    }

    pub fn success(&self, msg: &str) {
        if self.human() {
            println!("{} {}", style("✓").green(), msg);
        }
    }

    pub fn warn(&self, msg: &str) {
        if self.human() {
            eprintln!("{} {}", style("⚠").yellow(), msg);
        }
    }

    /// Errors are always shown; in JSON mode as `{"error": ...}` on stderr.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            eprintln!("{} {}", style("✗").red(), style(msg).red());
        }
    }

    /// Only with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if self.verbose && self.human() {
            eprintln!("{} {}", style("→").dim(), style(msg).dim());
        }
    }

    pub fn header(&self, msg: &str) {
        if self.human() {
            println!("\n{}", style(msg).bold().underlined());
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if self.human() {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    pub fn list_item(&self, item: &str) {
        if self.human() {
            println!("  {} {}", style("•").dim(), item);
        }
    }

    /// Left-aligned columns, padded to `widths`.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if !self.human() {
            return;
        }
        let row: Vec<String> = cols
            .iter()
            .zip(widths)
            .map(|(col, width)| format!("{col:width$}"))
            .collect();
        println!("  {}", row.join("  "));
    }

    /// Pretty-printed JSON document on stdout.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(doc) => println!("{doc}"),
            Err(e) => tracing::error!(error = %e, "could not serialize output"),
        }
    }

    /// Spinner shown while waiting on the commerce or payment API.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if !self.human() {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

/// Colored badge for order-status and checkout states.
pub fn status_badge(status: &str) -> String {
    match status {
        "success" | "completed" => style(status).green().to_string(),
        "started" | "order_created" | "payment_session_opened" => style(status).yellow().to_string(),
        "failed" | "cancelled" => style(status).red().to_string(),
        _ => status.to_string(),
    }
}

/// `৳400.00 ৳500.00 -20%` with the selling price struck through.
pub fn price_with_offer(effective: &str, selling: &str, percent: u32) -> String {
    format!(
        "{} {} {}",
        style(effective).bold(),
        style(selling).dim().strikethrough(),
        style(format!("-{percent}%")).green()
    )
}
