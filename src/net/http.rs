use super::backend::{ApiRequest, ApiResponse, Backend, Method};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use std::time::Duration;

/// `Backend` over HTTP using reqwest.
pub struct HttpBackend {
    client: reqwest::Client,
    api_base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            api_base: api_base(base_url)?,
        })
    }

    fn endpoint(&self, request: &ApiRequest) -> Result<Url> {
        let mut url = self
            .api_base
            .join(request.path.trim_start_matches('/'))
            .with_context(|| format!("Invalid API path: {}", request.path))?;

        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }

        Ok(url)
    }
}

fn api_base(base_url: &str) -> Result<Url> {
    let trimmed = base_url.trim_end_matches('/');
    Url::parse(&format!("{trimmed}/api/"))
        .with_context(|| format!("Invalid backend URL: {}", base_url))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn call(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.endpoint(&request)?;
        tracing::debug!("{} {}", request.method, url);

        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, url.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("{} {} failed", request.method, url))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        Ok(ApiResponse { status, body })
    }
}
