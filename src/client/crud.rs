use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};

use super::{ApiClient, FetchError, QueryOptions};

/// Lifecycle of one mutation slot: `Idle → Loading → (Success | Error)`.
/// Every new invocation resets to `Loading` first, whatever the previous
/// terminal state was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MutationStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct MutationSnapshot {
    pub status: MutationStatus,
    pub data: Option<Value>,
    pub error: Option<FetchError>,
}

impl MutationSnapshot {
    pub fn is_loading(&self) -> bool {
        self.status == MutationStatus::Loading
    }

    pub fn is_success(&self) -> bool {
        self.status == MutationStatus::Success
    }

    pub fn is_error(&self) -> bool {
        self.status == MutationStatus::Error
    }
}

#[derive(Default)]
struct QueryState {
    data: Option<Value>,
    error: Option<FetchError>,
    is_loading: bool,
    is_validating: bool,
}

#[derive(Debug, Clone)]
pub struct QuerySnapshot {
    pub data: Option<Value>,
    pub error: Option<FetchError>,
    pub is_loading: bool,
    pub is_validating: bool,
}

/// Read handle for one resource query. `load` serves from the shared cache;
/// `mutate` forces a revalidation of this exact key.
pub struct ResourceQuery {
    client: Arc<ApiClient>,
    path: String,
    options: QueryOptions,
    state: Mutex<QueryState>,
}

impl ResourceQuery {
    pub fn new(client: Arc<ApiClient>, endpoint: &str) -> Self {
        Self::with_options(client, endpoint, QueryOptions::default())
    }

    pub fn with_options(client: Arc<ApiClient>, endpoint: &str, options: QueryOptions) -> Self {
        Self {
            client,
            path: format!("/resource/{}", endpoint),
            options,
            state: Mutex::new(QueryState::default()),
        }
    }

    pub async fn load(&self) -> Result<Value, FetchError> {
        {
            let mut state = self.lock();
            if state.data.is_none() {
                state.is_loading = true;
            } else {
                state.is_validating = true;
            }
        }
        let result = self.client.fetch(&self.path, &self.options).await;
        self.finish(result)
    }

    pub async fn mutate(&self) -> Result<Value, FetchError> {
        {
            self.lock().is_validating = true;
        }
        let result = self.client.refresh(&self.path, &self.options).await;
        self.finish(result)
    }

    pub fn snapshot(&self) -> QuerySnapshot {
        let state = self.lock();
        QuerySnapshot {
            data: state.data.clone(),
            error: state.error.clone(),
            is_loading: state.is_loading,
            is_validating: state.is_validating,
        }
    }

    fn finish(&self, result: Result<Value, FetchError>) -> Result<Value, FetchError> {
        let mut state = self.lock();
        state.is_loading = false;
        state.is_validating = false;
        match &result {
            Ok(data) => {
                state.data = Some(data.clone());
                state.error = None;
            }
            Err(e) => {
                state.error = Some(e.clone());
            }
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, QueryState> {
        self.state.lock().expect("query state lock poisoned")
    }
}

/// Mutation handle for one resource. Each operation is a single request; the
/// outcome is stored in the snapshot and re-raised to the caller.
pub struct ResourceMutations {
    client: Arc<ApiClient>,
    path: String,
    state: Mutex<MutationSnapshot>,
}

impl ResourceMutations {
    pub fn new(client: Arc<ApiClient>, endpoint: &str) -> Self {
        Self {
            client,
            path: format!("/resource/{}", endpoint),
            state: Mutex::new(MutationSnapshot::default()),
        }
    }

    pub async fn create(&self, body: &Value) -> Result<Value, FetchError> {
        self.begin();
        let result = self.client.post_json(&self.path, body).await;
        self.settle(result)
    }

    pub async fn update(&self, id: &str, body: &Value) -> Result<Value, FetchError> {
        self.begin();
        let result = self
            .client
            .put_json(&format!("{}/{}", self.path, id), body)
            .await;
        self.settle(result)
    }

    pub async fn remove(&self, id: &str) -> Result<Value, FetchError> {
        self.begin();
        let result = self
            .client
            .delete_json(&format!("{}/{}", self.path, id))
            .await;
        self.settle(result)
    }

    pub fn snapshot(&self) -> MutationSnapshot {
        self.lock().clone()
    }

    fn begin(&self) {
        let mut state = self.lock();
        state.status = MutationStatus::Loading;
        state.data = None;
        state.error = None;
    }

    fn settle(&self, result: Result<Value, FetchError>) -> Result<Value, FetchError> {
        let mut state = self.lock();
        match &result {
            Ok(data) => {
                state.status = MutationStatus::Success;
                state.data = Some(data.clone());
            }
            Err(e) => {
                state.status = MutationStatus::Error;
                state.error = Some(e.clone());
            }
        }
        result
    }

    fn lock(&self) -> MutexGuard<'_, MutationSnapshot> {
        self.state.lock().expect("mutation state lock poisoned")
    }
}

/// Combined CRUD handle: a list query plus mutations that refresh it, so a
/// consumer rendering the list sees its own writes.
pub struct ResourceCrud {
    query: ResourceQuery,
    mutations: ResourceMutations,
}

impl ResourceCrud {
    pub fn new(client: Arc<ApiClient>, endpoint: &str) -> Self {
        Self::with_options(client, endpoint, QueryOptions::default())
    }

    pub fn with_options(client: Arc<ApiClient>, endpoint: &str, options: QueryOptions) -> Self {
        Self {
            query: ResourceQuery::with_options(client.clone(), endpoint, options),
            mutations: ResourceMutations::new(client, endpoint),
        }
    }

    pub async fn load(&self) -> Result<Value, FetchError> {
        self.query.load().await
    }

    pub fn items(&self) -> Option<Value> {
        self.query.snapshot().data
    }

    pub fn error(&self) -> Option<FetchError> {
        self.query.snapshot().error
    }

    pub fn is_loading(&self) -> bool {
        self.query.snapshot().is_loading
    }

    pub fn mutation(&self) -> MutationSnapshot {
        self.mutations.snapshot()
    }

    pub async fn create_item(&self, body: &Value) -> Result<Value, FetchError> {
        let created = self.mutations.create(body).await?;
        self.refresh_after_write().await;
        Ok(created)
    }

    pub async fn update_item(&self, id: &str, body: &Value) -> Result<Value, FetchError> {
        let updated = self.mutations.update(id, body).await?;
        self.refresh_after_write().await;
        Ok(updated)
    }

    pub async fn delete_item(&self, id: &str) -> Result<Value, FetchError> {
        let ack = self.mutations.remove(id).await?;
        self.refresh_after_write().await;
        Ok(ack)
    }

    pub async fn refresh(&self) -> Result<Value, FetchError> {
        self.query.mutate().await
    }

    async fn refresh_after_write(&self) {
        if let Err(e) = self.query.mutate().await {
            tracing::warn!(error = %e, "list refresh after mutation failed");
        }
    }
}
