use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use super::{ContentService, UpstreamError};

/// Production `ContentService` over HTTP. Injects the configured API token as
/// a Bearer credential on every call; requests are timeout-bounded by the
/// underlying client so a hung upstream surfaces as a transport error.
pub struct HttpContentService {
    http: reqwest::Client,
    base: Url,
    api_token: String,
}

impl HttpContentService {
    pub fn new(
        base_url: &str,
        api_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let base =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base,
            api_token: api_token.into(),
        })
    }

    fn url_for(&self, segments: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidUrl("base URL cannot be a base".to_string()))?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    async fn read_json(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<Value, UpstreamError> {
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl ContentService for HttpContentService {
    async fn list(
        &self,
        endpoint: &str,
        params: &HashMap<String, String>,
    ) -> Result<Value, UpstreamError> {
        let mut url = self.url_for(&[endpoint])?;
        url.query_pairs_mut().extend_pairs(params.iter());

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        self.read_json(endpoint, response).await
    }

    async fn get(
        &self,
        endpoint: &str,
        id: &str,
        params: &HashMap<String, String>,
    ) -> Result<Value, UpstreamError> {
        let mut url = self.url_for(&[endpoint, id])?;
        url.query_pairs_mut().extend_pairs(params.iter());

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        self.read_json(endpoint, response).await
    }

    async fn create(&self, endpoint: &str, body: &Value) -> Result<Value, UpstreamError> {
        let url = self.url_for(&[endpoint])?;

        let response = self
            .http
            .post(url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;
        self.read_json(endpoint, response).await
    }

    async fn update(
        &self,
        endpoint: &str,
        id: &str,
        body: &Value,
    ) -> Result<Value, UpstreamError> {
        let url = self.url_for(&[endpoint, id])?;

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.api_token)
            .json(body)
            .send()
            .await?;
        self.read_json(endpoint, response).await
    }

    async fn delete(&self, endpoint: &str, id: &str) -> Result<(), UpstreamError> {
        let url = self.url_for(&[endpoint, id])?;

        let response = self
            .http
            .delete(url)
            .bearer_auth(&self.api_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                endpoint: endpoint.to_string(),
            });
        }
        Ok(())
    }
}
