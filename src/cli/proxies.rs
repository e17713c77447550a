//! Proxies command implementation

use crate::cli::output::{format_proxies_json, format_proxies_table, format_rules_table};
use crate::cli::ProxiesArgs;
use crate::pool::ProxyView;
use crate::rotation::Rotator;

/// Handle `rotor proxies`
///
/// Shows the pool as it would be ranked right now, with the endpoint rules
/// below it.
pub fn handle_proxies(args: &ProxiesArgs, rotator: &Rotator) -> anyhow::Result<String> {
    let proxies: Vec<ProxyView> = rotator
        .ranked_proxies()
        .iter()
        .map(|endpoint| endpoint.snapshot())
        .collect();
    let rules = rotator.endpoints().rules();

    if args.json {
        return Ok(format_proxies_json(&proxies, &rules)?);
    }

    let mut output = format_proxies_table(&proxies);
    if proxies.is_empty() {
        output.push_str("\nNo usable proxies; requests will go direct.");
    }
    if !rules.is_empty() {
        output.push_str("\n\nEndpoint limits:\n");
        output.push_str(&format_rules_table(&rules));
    }
    Ok(output)
}
