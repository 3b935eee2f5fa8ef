use serde_json::Value;
use std::collections::BTreeMap;

/// Options for a read query against the gateway. The named fields mirror
/// what the content service understands (`fields`, `populate`, `filters`,
/// `sort`, `pagination`); anything else goes through `extra` untouched.
///
/// Structured values are JSON-serialized into the query string; the pair
/// list is emitted in sorted key order so the derived cache key does not
/// depend on construction order.
#[derive(Debug, Default, Clone)]
pub struct QueryOptions {
    pub fields: Option<Value>,
    pub populate: Option<Value>,
    pub filters: Option<Value>,
    pub sort: Option<Value>,
    pub pagination: Option<Value>,
    pub extra: BTreeMap<String, Value>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fields(mut self, fields: &[&str]) -> Self {
        self.fields = Some(Value::Array(
            fields.iter().map(|f| Value::String(f.to_string())).collect(),
        ));
        self
    }

    /// `fields` from an already-built JSON value, e.g. parsed user input.
    pub fn with_fields_value(mut self, fields: impl Into<Value>) -> Self {
        self.fields = Some(fields.into());
        self
    }

    pub fn with_populate(mut self, populate: impl Into<Value>) -> Self {
        self.populate = Some(populate.into());
        self
    }

    pub fn with_filters(mut self, filters: impl Into<Value>) -> Self {
        self.filters = Some(filters.into());
        self
    }

    pub fn with_sort(mut self, sort: impl Into<Value>) -> Self {
        self.sort = Some(sort.into());
        self
    }

    pub fn with_pagination(mut self, pagination: impl Into<Value>) -> Self {
        self.pagination = Some(pagination.into());
        self
    }

    /// Arbitrary passthrough parameter, e.g. `?category=balances`.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    /// Flatten into query-string pairs, sorted by key.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: BTreeMap<String, String> = BTreeMap::new();

        let named = [
            ("fields", &self.fields),
            ("populate", &self.populate),
            ("filters", &self.filters),
            ("sort", &self.sort),
            ("pagination", &self.pagination),
        ];
        for (key, value) in named {
            if let Some(v) = value {
                pairs.insert(key.to_string(), encode_value(v));
            }
        }
        for (key, value) in &self.extra {
            pairs.insert(key.clone(), encode_value(value));
        }

        pairs.into_iter().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_none()
            && self.populate.is_none()
            && self.filters.is_none()
            && self.sort.is_none()
            && self.pagination.is_none()
            && self.extra.is_empty()
    }
}

fn encode_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string(value).unwrap_or_default()
        }
        other => other.to_string(),
    }
}

/// Cache key for one logical query: a pure deterministic function of the
/// path and the canonicalized parameters. Logically-equal option sets with
/// differently ordered keys collapse to the same key.
pub fn cache_key(path: &str, options: &QueryOptions) -> String {
    let pairs = options.to_pairs();
    if pairs.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!("{}?{}", path, query.join("&"))
}
