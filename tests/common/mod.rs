//! Shared test utilities for Rotor integration tests.
//!
//! Provides configuration builders, a scripted transport that records every
//! attempt, and helpers for standing up wiremock servers as proxies.

#![allow(dead_code)]

use async_trait::async_trait;
use reqwest::StatusCode;
use rotor::config::{EndpointRuleConfig, ProxyConfig, RotorConfig};
use rotor::pool::DIRECT;
use rotor::rotation::Rotator;
use rotor::transport::{HttpTransport, OutboundRequest, OutboundResponse, Transport, TransportError};
use std::collections::{HashMap, VecDeque};
use std::net::TcpListener;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Configuration Builders
// =============================================================================

/// Configuration with the given proxy addresses and no limits.
pub fn proxies_config(addresses: &[&str]) -> RotorConfig {
    RotorConfig {
        proxies: addresses.iter().map(|a| ProxyConfig::new(*a)).collect(),
        ..RotorConfig::default()
    }
}

/// Configuration with a single endpoint rule and no proxies.
pub fn endpoint_config(pattern: &str, limit: i32, window_seconds: i64) -> RotorConfig {
    RotorConfig {
        endpoints: vec![EndpointRuleConfig::new(pattern, limit, window_seconds)],
        ..RotorConfig::default()
    }
}

/// Rotator over the real HTTP transport with short timeouts.
pub fn http_rotator(config: &RotorConfig) -> Arc<Rotator> {
    let mut transport = config.transport.clone();
    transport.timeout_seconds = 5;
    transport.connect_timeout_seconds = 2;
    Arc::new(Rotator::new(config, Arc::new(HttpTransport::new(transport))))
}

// =============================================================================
// Network Helpers
// =============================================================================

/// A proxy address nothing listens on, so connecting is refused.
pub fn unreachable_proxy() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}", port)
}

/// A wiremock server that answers every request with `status` and `body`.
///
/// Used as an HTTP proxy: requests forwarded through it arrive in absolute
/// form and match `any()`.
pub async fn echo_proxy(status: u16, body: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(&server)
        .await;
    server
}

/// Target URL on a host that is never resolved because a proxy carries it.
pub fn proxied_target(path: &str) -> String {
    format!("http://origin.rotor.test{}", path)
}

// =============================================================================
// Scripted Transport
// =============================================================================

/// One scripted transport reaction.
pub enum Step {
    Respond(u16),
    Fail(TransportError),
    Delay(Duration, u16),
}

/// Transport that plays back per-egress scripts and records every attempt.
///
/// Egress paths without a script (or whose script ran out) answer 200.
#[derive(Default)]
pub struct ScriptedTransport {
    scripts: Mutex<HashMap<String, VecDeque<Step>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, egress: &str, steps: Vec<Step>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(egress.to_string(), steps.into());
        self
    }

    /// Egress names in call order (`direct` for no proxy).
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, egress: &str) -> usize {
        self.calls().iter().filter(|c| *c == egress).count()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(
        &self,
        _request: OutboundRequest,
        egress: Option<&str>,
    ) -> Result<OutboundResponse, TransportError> {
        let key = egress.unwrap_or(DIRECT).to_string();
        self.calls.lock().unwrap().push(key.clone());
        let step = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Step::Respond(200));

        let egress = egress.map(str::to_string);
        match step {
            Step::Respond(code) => Ok(OutboundResponse::new(
                StatusCode::from_u16(code).unwrap(),
                egress,
            )),
            Step::Fail(error) => Err(error),
            Step::Delay(delay, code) => {
                tokio::time::sleep(delay).await;
                Ok(OutboundResponse::new(
                    StatusCode::from_u16(code).unwrap(),
                    egress,
                ))
            }
        }
    }
}

pub fn refused() -> Step {
    Step::Fail(TransportError::Connect("connection refused".to_string()))
}
