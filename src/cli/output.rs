//! Output formatting helpers for CLI commands

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

use crate::endpoints::RuleView;
use crate::pool::ProxyView;

/// Outcome of one `rotor fetch` URL.
#[derive(Debug, Clone, Serialize)]
pub struct FetchView {
    pub url: String,
    pub status: Option<u16>,
    pub egress: Option<String>,
    pub latency_ms: u64,
    pub bytes: usize,
    pub error: Option<String>,
}

impl FetchView {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

/// Format proxies (already ranked) as a table
pub fn format_proxies_table(proxies: &[ProxyView]) -> String {
    let mut table = new_table(vec![
        "#", "Proxy", "Success", "Failure", "Rate", "Avg Latency", "Score", "Limit",
    ]);

    for (rank, p) in proxies.iter().enumerate() {
        let rate = format!("{:.0}%", p.success_rate * 100.0);
        let rate = if p.success_rate >= 0.9 {
            rate.green().to_string()
        } else if p.success_rate >= 0.5 {
            rate.yellow().to_string()
        } else {
            rate.red().to_string()
        };

        table.add_row(vec![
            Cell::new(rank + 1),
            Cell::new(&p.name),
            Cell::new(p.success_count),
            Cell::new(p.failure_count),
            Cell::new(rate),
            Cell::new(format!("{:.1}ms", p.average_latency_ms)),
            Cell::new(format!("{:.2}", p.score)),
            Cell::new(p.limit.as_deref().unwrap_or("-")),
        ]);
    }

    table.to_string()
}

/// Format endpoint rules as a table
pub fn format_rules_table(rules: &[RuleView]) -> String {
    let mut table = new_table(vec!["Pattern", "Limit", "Window", "Available"]);

    for r in rules {
        table.add_row(vec![
            Cell::new(&r.pattern),
            Cell::new(r.limit),
            Cell::new(format!("{}s", r.window_seconds)),
            Cell::new(r.available),
        ]);
    }

    table.to_string()
}

/// Format proxies and rules as JSON
pub fn format_proxies_json(
    proxies: &[ProxyView],
    rules: &[RuleView],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "proxies": proxies,
        "endpoints": rules,
    }))
}

/// Format fetch results as a table
pub fn format_fetch_table(results: &[FetchView]) -> String {
    let mut table = new_table(vec!["URL", "Status", "Egress", "Latency", "Bytes"]);

    for r in results {
        let status = match (r.status, &r.error) {
            (Some(code), _) if code < 400 => code.to_string().green().to_string(),
            (Some(code), _) => code.to_string().yellow().to_string(),
            (None, Some(error)) => error.red().to_string(),
            (None, None) => "-".to_string(),
        };

        table.add_row(vec![
            Cell::new(&r.url),
            Cell::new(status),
            Cell::new(r.egress.as_deref().unwrap_or("-")),
            Cell::new(format!("{}ms", r.latency_ms)),
            Cell::new(r.bytes),
        ]);
    }

    table.to_string()
}

/// Format fetch results as JSON
pub fn format_fetch_json(results: &[FetchView]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({ "results": results }))
}
