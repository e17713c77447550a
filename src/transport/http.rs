use async_trait::async_trait;
use dashmap::DashMap;
use reqwest::{Client, Proxy, Url};
use std::time::Duration;

use super::{OutboundRequest, OutboundResponse, Transport, TransportError};
use crate::config::TransportConfig;

/// reqwest-backed transport.
///
/// reqwest binds proxies to a client, so one client is built lazily per
/// egress address and cached; the direct path gets a client with proxy
/// detection disabled. Each client keeps its own connection pool.
pub struct HttpTransport {
    config: TransportConfig,
    clients: DashMap<Option<String>, Client>,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            clients: DashMap::new(),
        }
    }

    fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_seconds)
    }

    /// Client for `egress`, built on first use.
    fn client_for(&self, egress: Option<&str>) -> Result<Client, TransportError> {
        let key = egress.map(str::to_string);
        if let Some(client) = self.clients.get(&key) {
            return Ok(client.clone());
        }

        let builder = Client::builder()
            .timeout(self.default_timeout())
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_seconds))
            .user_agent(self.config.user_agent.clone());

        let builder = match egress {
            Some(address) => {
                let proxy = Proxy::all(address).map_err(|e| {
                    TransportError::Connect(format!("invalid proxy address '{}': {}", address, e))
                })?;
                builder.proxy(proxy)
            }
            None => builder.no_proxy(),
        };

        let client = builder
            .build()
            .map_err(|e| TransportError::Connect(format!("failed to build client: {}", e)))?;

        tracing::debug!(egress = egress.unwrap_or(crate::pool::DIRECT), "Built HTTP client");
        Ok(self.clients.entry(key).or_insert(client).clone())
    }

    /// Number of cached clients.
    pub fn client_count(&self) -> usize {
        self.clients.len()
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(TransportConfig::default())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        request: OutboundRequest,
        egress: Option<&str>,
    ) -> Result<OutboundResponse, TransportError> {
        let url = Url::parse(request.url.trim()).map_err(|e| {
            TransportError::InvalidRequest(format!("invalid URL '{}': {}", request.url, e))
        })?;
        let client = self.client_for(egress)?;
        let timeout = request.options.timeout.unwrap_or_else(|| self.default_timeout());

        let mut builder = client
            .request(request.method, url)
            .headers(request.headers)
            .version(request.version)
            .body(request.body);
        if let Some(timeout) = request.options.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        let status = response.status();
        let headers = response.headers().clone();
        let version = response.version();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::from_reqwest(e, timeout))?;

        Ok(OutboundResponse {
            status,
            headers,
            body: body.to_vec(),
            version,
            egress: egress.map(str::to_string),
        })
    }
}
