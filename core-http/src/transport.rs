//! Base wire transport over `reqwest`.

use async_trait::async_trait;
use connector_traits::{
    ConnectorError, HttpMethod, HttpRequest, HttpResponse, HttpTransport, Result,
};
use std::collections::HashMap;
use std::time::Duration;

/// Connection pool and timeout settings for the shared `reqwest`
/// client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Default per-request timeout; individual requests may override.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_max_idle_per_host: 8,
            user_agent: format!("kbsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// [`HttpTransport`] performing exactly one wire exchange per call.
///
/// Automatic redirect following is disabled so the redirect
/// interceptor can apply its own hop limit and cross-origin header
/// policy.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: TransportConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(config.user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| {
                ConnectorError::OperationFailed(format!("HTTP client construction failed: {e}"))
            })?;
        Ok(Self { client })
    }

    fn map_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
        }
    }

    fn map_error(err: reqwest::Error) -> ConnectorError {
        if err.is_timeout() {
            ConnectorError::Timeout(err.to_string())
        } else if err.is_connect() {
            ConnectorError::Connect(err.to_string())
        } else {
            ConnectorError::OperationFailed(err.to_string())
        }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut builder = self
            .client
            .request(Self::map_method(request.method), &request.url);

        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(Self::map_error)?;

        let status = response.status().as_u16();
        let mut headers = HashMap::new();
        for (key, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(key.to_string(), value.to_string());
            }
        }
        let body = response.bytes().await.map_err(Self::map_error)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
