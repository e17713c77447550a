use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Version};
use std::collections::BTreeMap;
use std::time::Duration;

use super::TransportError;

/// Per-request settings that travel with every attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Overrides the transport's default per-attempt timeout
    pub timeout: Option<Duration>,
    /// Free-form values for custom transports
    pub properties: BTreeMap<String, String>,
}

/// An outbound HTTP request with a fully buffered body.
///
/// A request is never sent as-is: each attempt sends a
/// [`fresh_copy`](Self::fresh_copy), so a failed attempt leaves the original
/// intact for the next egress path.
///
/// # Examples
///
/// ```
/// use rotor::transport::OutboundRequest;
/// use std::time::Duration;
///
/// let request = OutboundRequest::get("https://api.example.com/v1/items")
///     .with_header("accept", "application/json")
///     .unwrap()
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(request.target(), Some("https://api.example.com/v1/items"));
/// assert_eq!(request.headers["accept"], "application/json");
/// ```
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub version: Version,
    pub options: RequestOptions,
}

impl OutboundRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: Vec::new(),
            version: Version::HTTP_11,
            options: RequestOptions::default(),
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    /// Append a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, TransportError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| TransportError::InvalidRequest(format!("header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| TransportError::InvalidRequest(format!("header value for '{}': {}", name, e)))?;
        self.headers.append(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    /// The URL used for endpoint rule resolution; `None` when blank.
    pub fn target(&self) -> Option<&str> {
        let url = self.url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }

    /// An unsent copy for one attempt: method, target, headers, body,
    /// version and options.
    pub fn fresh_copy(&self) -> Self {
        self.clone()
    }
}

/// A received HTTP response. Any status code counts as a delivered response.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub version: Version,
    /// Proxy that carried the request; `None` for direct
    pub egress: Option<String>,
}

impl OutboundResponse {
    /// A response with an empty body and no headers.
    pub fn new(status: StatusCode, egress: Option<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Vec::new(),
            version: Version::HTTP_11,
            egress,
        }
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_url_has_no_target() {
        assert_eq!(OutboundRequest::get("").target(), None);
        assert_eq!(OutboundRequest::get("   ").target(), None);
    }

    #[test]
    fn test_fresh_copy_carries_everything() {
        let mut request = OutboundRequest::post("https://a/b", b"payload".to_vec())
            .with_header("x-trace", "1")
            .unwrap()
            .with_timeout(Duration::from_millis(300));
        request.version = Version::HTTP_2;
        request
            .options
            .properties
            .insert("tenant".to_string(), "blue".to_string());

        let copy = request.fresh_copy();
        assert_eq!(copy.method, Method::POST);
        assert_eq!(copy.url, "https://a/b");
        assert_eq!(copy.headers["x-trace"], "1");
        assert_eq!(copy.body, b"payload");
        assert_eq!(copy.version, Version::HTTP_2);
        assert_eq!(copy.options, request.options);
    }

    #[test]
    fn test_invalid_header_is_rejected() {
        let result = OutboundRequest::get("https://a/").with_header("bad header", "v");
        assert!(matches!(result, Err(TransportError::InvalidRequest(_))));
    }
}
