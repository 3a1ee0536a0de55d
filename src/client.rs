//! HTTP client for the Tasking Manager API

use crate::config::ClientConfig;
use crate::context::RequestContext;
use crate::error::{ClientError, Result};
use reqwest::{header, Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// HTTP client bound to one API root
///
/// # Example
///
/// ```rust,no_run
/// use tasking_client::{ApiClient, ClientConfig, RequestContext};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let api = ApiClient::new(ClientConfig {
///     base_url: "https://tasks.example.org/api/v2/".into(),
///     ..Default::default()
/// })?;
///
/// let project = api
///     .get("projects/42/", &[], &RequestContext::anonymous(), &CancellationToken::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    /// Create a new client
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a relative resource path
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Issue one GET and return the JSON body.
    ///
    /// Resolves to [`ClientError::Cancelled`] as soon as `cancel` fires; the
    /// in-flight request is dropped.
    pub async fn get(
        &self,
        path: &str,
        query: &[(String, String)],
        ctx: &RequestContext,
        cancel: &CancellationToken,
    ) -> Result<Value> {
        let mut request = self.client.get(self.url(path));
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(ref token) = ctx.token {
            request = request.header(header::AUTHORIZATION, format!("Token {}", token));
        }
        if let Some(ref locale) = ctx.locale {
            request = request.header(header::ACCEPT_LANGUAGE, locale.as_str());
        }

        debug!(path, params = query.len(), "GET");

        let fetch = async {
            let response = request.send().await?;
            self.handle_response(path, response).await
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ClientError::Cancelled),
            result = fetch => result,
        }
    }

    // ==================== Helper Methods ====================

    async fn handle_response(&self, path: &str, response: reqwest::Response) -> Result<Value> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status,
                message: body,
            });
        }

        let body = response.json().await?;
        Ok(body)
    }
}
