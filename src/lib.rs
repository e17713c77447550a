//! Rotor - rate-limited outbound HTTP dispatch with health-ranked proxy failover
//!
//! Every request passes two independent token-bucket limits: one keyed by the
//! target URL pattern, held for the whole request, and one per proxy, held
//! for a single attempt. Proxies are tried best-score first; a failed attempt
//! lowers the proxy's score and the next proxy is tried, until one succeeds
//! or all have failed.
//!
//! # Modules
//!
//! - [`config`] - TOML configuration snapshot and validation
//! - [`limiter`] - Token-bucket rate limiter with FIFO waiting
//! - [`pool`] - Proxy pool, health counters and ranking
//! - [`endpoints`] - Target-pattern rate limit rules
//! - [`transport`] - Outbound request/response types and the HTTP transport
//! - [`rotation`] - The failover orchestrator
//! - [`reload`] - Configuration file watcher
//! - [`logging`] - Tracing setup
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod endpoints;
pub mod limiter;
pub mod logging;
pub mod pool;
pub mod reload;
pub mod rotation;
pub mod transport;
