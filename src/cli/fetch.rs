//! Fetch command implementation

use futures::stream::{self, StreamExt};
use reqwest::Method;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::cli::output::{format_fetch_json, format_fetch_table, FetchView};
use crate::cli::{load_config, FetchArgs};
use crate::logging::init_tracing;
use crate::reload::ConfigWatcher;
use crate::rotation::Rotator;
use crate::transport::{HttpTransport, OutboundRequest};

/// Split a `Name: value` header argument.
pub fn parse_header(raw: &str) -> anyhow::Result<(&str, &str)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => anyhow::bail!("invalid header '{}': expected 'Name: value'", raw),
    }
}

/// Build the request for one URL from the command arguments.
pub fn build_request(args: &FetchArgs, url: &str) -> anyhow::Result<OutboundRequest> {
    let method = Method::from_bytes(args.method.to_ascii_uppercase().as_bytes())
        .map_err(|_| anyhow::anyhow!("invalid HTTP method '{}'", args.method))?;

    let mut request = OutboundRequest::new(method, url);
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.with_header(name, value)?;
    }
    if let Some(data) = &args.data {
        request = request.with_body(data.as_bytes().to_vec());
    }
    if let Some(timeout) = args.timeout {
        request = request.with_timeout(Duration::from_secs(timeout));
    }
    Ok(request)
}

/// Submit every request, at most `concurrency` at a time, keeping input order.
pub async fn fetch_all(
    rotator: &Rotator,
    requests: Vec<OutboundRequest>,
    concurrency: usize,
    cancel: &CancellationToken,
) -> Vec<(FetchView, Vec<u8>)> {
    stream::iter(requests)
        .map(|request| async move {
            let url = request.url.clone();
            let started = Instant::now();
            let result = rotator.submit(request, cancel).await;
            let latency_ms = started.elapsed().as_millis() as u64;

            match result {
                Ok(response) => (
                    FetchView {
                        url,
                        status: Some(response.status.as_u16()),
                        egress: Some(
                            response
                                .egress
                                .clone()
                                .unwrap_or_else(|| crate::pool::DIRECT.to_string()),
                        ),
                        latency_ms,
                        bytes: response.body.len(),
                        error: None,
                    },
                    response.body,
                ),
                Err(e) => (
                    FetchView {
                        url,
                        status: None,
                        egress: None,
                        latency_ms,
                        bytes: 0,
                        error: Some(e.to_string()),
                    },
                    Vec::new(),
                ),
            }
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

/// Handle `rotor fetch`
pub async fn run_fetch(args: FetchArgs) -> anyhow::Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config.logging)
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    let requests = args
        .urls
        .iter()
        .map(|url| build_request(&args, url))
        .collect::<anyhow::Result<Vec<_>>>()?;

    let transport = Arc::new(HttpTransport::new(config.transport.clone()));
    let rotator = Arc::new(Rotator::new(&config, transport));

    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, cancelling in-flight requests");
                shutdown.cancel();
            }
        });
    }

    let watcher_cancel = shutdown.child_token();
    let watcher = if (args.watch || config.reload.enabled) && args.config.exists() {
        let interval = Duration::from_secs(config.reload.interval_seconds.max(1));
        let watcher = ConfigWatcher::new(&args.config, Arc::clone(&rotator), interval);
        Some(watcher.start(watcher_cancel.clone()))
    } else {
        None
    };

    let results = fetch_all(&rotator, requests, args.concurrency, &shutdown).await;

    watcher_cancel.cancel();
    if let Some(handle) = watcher {
        let _ = handle.await;
    }

    let views: Vec<FetchView> = results.iter().map(|(view, _)| view.clone()).collect();
    if args.json {
        println!("{}", format_fetch_json(&views)?);
    } else {
        println!("{}", format_fetch_table(&views));
    }
    if args.show_body {
        for (view, body) in &results {
            if view.is_success() {
                println!("==> {} <==", view.url);
                println!("{}", String::from_utf8_lossy(body));
            }
        }
    }

    let failed = views.iter().filter(|v| !v.is_success()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} requests failed", failed, views.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;

    fn fetch_args(argv: &[&str]) -> FetchArgs {
        let mut full = vec!["rotor", "fetch"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).unwrap().command {
            Commands::Fetch(args) => args,
            _ => panic!("Expected Fetch command"),
        }
    }

    #[test]
    fn test_parse_header_trims_name_and_value() {
        assert_eq!(
            parse_header("Accept :  text/plain ").unwrap(),
            ("Accept", "text/plain")
        );
        assert_eq!(parse_header("X-Empty:").unwrap(), ("X-Empty", ""));
    }

    #[test]
    fn test_parse_header_rejects_missing_colon() {
        assert!(parse_header("Accept text/plain").is_err());
        assert!(parse_header(": value").is_err());
    }

    #[test]
    fn test_build_request_applies_arguments() {
        let args = fetch_args(&[
            "https://a/",
            "-X",
            "put",
            "-H",
            "X-Trace: 7",
            "-d",
            "payload",
            "--timeout",
            "3",
        ]);
        let request = build_request(&args, "https://a/").unwrap();

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.headers["x-trace"], "7");
        assert_eq!(request.body, b"payload");
        assert_eq!(request.options.timeout, Some(Duration::from_secs(3)));
    }

    #[test]
    fn test_build_request_rejects_bad_method() {
        let args = fetch_args(&["https://a/", "-X", "BAD METHOD"]);
        assert!(build_request(&args, "https://a/").is_err());
    }
}
