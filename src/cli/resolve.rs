//! Resolve command implementation

use serde::Serialize;

use crate::cli::ResolveArgs;
use crate::rotation::Rotator;

/// What a request to one target would go through.
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub target: String,
    /// Matching endpoint rule pattern, if any
    pub rule: Option<String>,
    /// Endpoint limiter as `limit/period`
    pub limit: Option<String>,
    /// Egress paths in the order they would be tried
    pub candidates: Vec<String>,
}

/// Resolve `target` against the rotator's current rules and pool.
pub fn resolve(rotator: &Rotator, target: &str) -> Resolution {
    let rule = rotator.endpoints().resolve_rule(Some(target));
    Resolution {
        target: target.to_string(),
        rule: rule.as_ref().map(|m| m.pattern.clone()),
        limit: rule.as_ref().map(|m| m.limiter.to_string()),
        candidates: rotator
            .ranked_proxies()
            .iter()
            .map(|e| e.display_name().to_string())
            .collect(),
    }
}

/// Handle `rotor resolve`
pub fn handle_resolve(args: &ResolveArgs, rotator: &Rotator) -> String {
    let resolution = resolve(rotator, &args.url);

    let mut lines = vec![format!("Target:   {}", resolution.target)];
    match (&resolution.rule, &resolution.limit) {
        (Some(rule), Some(limit)) => lines.push(format!("Rule:     {} ({})", rule, limit)),
        _ => lines.push("Rule:     none (unlimited)".to_string()),
    }
    if resolution.candidates.is_empty() {
        lines.push("Order:    direct".to_string());
    } else {
        lines.push(format!("Order:    {}", resolution.candidates.join(" -> ")));
    }
    lines.join("\n")
}
