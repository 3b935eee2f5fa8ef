pub mod cache;
pub mod crud;
pub mod query;

use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub use cache::QueryCache;
pub use crud::{
    MutationSnapshot, MutationStatus, QuerySnapshot, ResourceCrud, ResourceMutations,
    ResourceQuery,
};
pub use query::{cache_key, QueryOptions};

/// Client-side failure: any network error or non-2xx response. Carries the
/// server-provided `error` message when one can be extracted, otherwise the
/// HTTP status text.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("{message}")]
    Status { status: u16, message: String },
}

impl FetchError {
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Transport(_) => None,
        }
    }
}

/// Request client for the gateway's routes: cached reads plus direct
/// mutations. Cheap to share behind an `Arc`; all state lives in the cache.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    cache: QueryCache,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            cache: QueryCache::new(Duration::from_millis(2000)),
        }
    }

    /// Authenticated variant; the token rides every request as a Bearer
    /// credential.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_dedup_window(mut self, window: Duration) -> Self {
        self.cache = QueryCache::new(window);
        self
    }

    /// Bound every request by a timeout. Builder failures surface as
    /// `Transport` errors rather than panicking.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, FetchError> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dedup_window(&self) -> Duration {
        self.cache.dedup_window()
    }

    /// Cached read. Concurrent identical queries share one in-flight request.
    pub async fn fetch(&self, path: &str, options: &QueryOptions) -> Result<Value, FetchError> {
        let key = cache_key(path, options);
        self.cache
            .get_or_fetch(&key, self.get_request(path, options))
            .await
    }

    /// Re-fetch unless the entry is fresher than the dedup window. Suits
    /// implicit triggers that may fire in quick succession.
    pub async fn revalidate(
        &self,
        path: &str,
        options: &QueryOptions,
    ) -> Result<Value, FetchError> {
        let key = cache_key(path, options);
        self.cache
            .revalidate(&key, self.get_request(path, options))
            .await
    }

    /// Force a revalidation of the exact key, ignoring the dedup window.
    /// This is what `mutate()` and post-mutation refreshes use.
    pub async fn refresh(&self, path: &str, options: &QueryOptions) -> Result<Value, FetchError> {
        let key = cache_key(path, options);
        self.cache.invalidate(&key);
        self.cache
            .get_or_fetch(&key, self.get_request(path, options))
            .await
    }

    /// Drop the cache entry for a query without fetching.
    pub fn invalidate(&self, path: &str, options: &QueryOptions) {
        self.cache.invalidate(&cache_key(path, options));
    }

    /// Last known cached value for a query, if any.
    pub fn cached(&self, path: &str, options: &QueryOptions) -> Option<Value> {
        self.cache.peek(&cache_key(path, options))
    }

    /// Uncached GET.
    pub async fn get_json(&self, path: &str, options: &QueryOptions) -> Result<Value, FetchError> {
        self.get_request(path, options).await
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, FetchError> {
        let request = self.authorized(self.http.post(self.url(path))).json(body);
        Self::read_response(request.send().await).await
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> Result<Value, FetchError> {
        let request = self.authorized(self.http.put(self.url(path))).json(body);
        Self::read_response(request.send().await).await
    }

    pub async fn delete_json(&self, path: &str) -> Result<Value, FetchError> {
        let request = self.authorized(self.http.delete(self.url(path)));
        Self::read_response(request.send().await).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Build a GET future that owns everything it needs, so the cache can
    /// hold it as a shared in-flight request.
    fn get_request(
        &self,
        path: &str,
        options: &QueryOptions,
    ) -> impl Future<Output = Result<Value, FetchError>> + Send + 'static {
        let http = self.http.clone();
        let url = self.url(path);
        let pairs = options.to_pairs();
        let token = self.token.clone();

        async move {
            let mut request = http.get(&url);
            if !pairs.is_empty() {
                request = request.query(&pairs);
            }
            if let Some(token) = token {
                request = request.bearer_auth(token);
            }
            Self::read_response(request.send().await).await
        }
    }

    async fn read_response(
        result: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Value, FetchError> {
        let response = result.map_err(|e| FetchError::Transport(e.to_string()))?;
        let status = response.status();

        if !status.is_success() {
            // Best-effort extraction of the server's error message
            let message = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|body| {
                    body.get("error")
                        .and_then(|e| e.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                });
            return Err(FetchError::Status {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))
    }
}
