//! Query parameters for `_all_docs` and view requests
//!
//! Both builders produce the query-string half of a request; the path half
//! is built by the facade.

use serde_json::{json, Value};
use tracing::warn;

use crate::error::{Error, Result};

/// Encode `key=value` pairs as a query string, including the leading `?`.
/// Returns an empty string when there are no pairs.
pub fn encode_query<K, V>(pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if pairs.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = pairs
        .iter()
        .map(|(k, v)| {
            format!(
                "{}={}",
                urlencoding::encode(k.as_ref()),
                urlencoding::encode(v.as_ref())
            )
        })
        .collect();
    format!("?{}", joined.join("&"))
}

/// Options for listing all documents of a database
///
/// # Example
/// ```
/// use paisley::query::ListDocOptions;
/// use serde_json::json;
///
/// let opts = ListDocOptions::new()
///     .startkey(json!("a"))
///     .include_docs()
///     .limit(10);
/// assert_eq!(opts.to_query(), "?startkey=%22a%22&include_docs=true&limit=10");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDocOptions {
    pub reverse: bool,
    pub startkey: Option<Value>,
    pub endkey: Option<Value>,
    pub include_docs: bool,
    pub limit: Option<u64>,
}

impl ListDocOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn startkey(mut self, key: impl Into<Value>) -> Self {
        self.startkey = Some(key.into());
        self
    }

    pub fn endkey(mut self, key: impl Into<Value>) -> Self {
        self.endkey = Some(key.into());
        self
    }

    pub fn include_docs(mut self) -> Self {
        self.include_docs = true;
        self
    }

    pub fn limit(mut self, n: u64) -> Self {
        self.limit = Some(n);
        self
    }

    /// Build options from keyword-style pairs.
    ///
    /// Recognized names are `reverse`, `startkey`, `endkey`, `include_docs`
    /// and `limit`. `count` is accepted as a deprecated alias for `limit`. A
    /// negative limit means no limit. Any other name fails the whole call.
    pub fn from_params<I, K>(params: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut opts = Self::default();
        let mut unknown = Vec::new();

        for (name, value) in params {
            match name.as_ref() {
                "reverse" => opts.reverse = flag("reverse", &value)?,
                "startkey" => opts.startkey = Some(value),
                "endkey" => opts.endkey = Some(value),
                "include_docs" => opts.include_docs = flag("include_docs", &value)?,
                "limit" => opts.limit = limit("limit", &value)?,
                "count" => {
                    warn!("listDoc 'count' parameter has been renamed to 'limit'");
                    opts.limit = limit("count", &value)?;
                }
                other => unknown.push(other.to_string()),
            }
        }

        if !unknown.is_empty() {
            return Err(Error::UnknownParameter(unknown.join(", ")));
        }
        Ok(opts)
    }

    /// Query string for `_all_docs`, including the leading `?`
    pub fn to_query(&self) -> String {
        let mut args: Vec<(&str, String)> = Vec::new();
        if self.reverse {
            args.push(("reverse", "true".to_string()));
        }
        if let Some(ref key) = self.startkey {
            args.push(("startkey", key.to_string()));
        }
        if let Some(ref key) = self.endkey {
            args.push(("endkey", key.to_string()));
        }
        if self.include_docs {
            args.push(("include_docs", "true".to_string()));
        }
        if let Some(n) = self.limit {
            args.push(("limit", n.to_string()));
        }
        encode_query(&args)
    }
}

fn flag(name: &str, value: &Value) -> Result<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Null => Ok(false),
        _ => Err(Error::InvalidParameter(format!("{name} must be a boolean"))),
    }
}

fn limit(name: &str, value: &Value) -> Result<Option<u64>> {
    match value.as_i64() {
        Some(n) if n >= 0 => Ok(Some(n as u64)),
        Some(_) => Ok(None),
        None => Err(Error::InvalidParameter(format!("{name} must be an integer"))),
    }
}

/// Parameters for querying a stored view
///
/// Every parameter value is JSON-encoded into the query string. `keys` is
/// the exception: it is sent as a `{"keys": [...]}` POST body, since a key
/// list can be arbitrarily long.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewQuery {
    params: Vec<(String, Value)>,
    keys: Option<Value>,
}

impl ViewQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a query from arbitrary name/value pairs.
    pub fn from_params<I, K>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        params
            .into_iter()
            .fold(Self::new(), |q, (name, value)| q.param(name.as_ref(), value))
    }

    /// Set a parameter, replacing any earlier value under the same name.
    ///
    /// The legacy name `count` is sent as `limit`.
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if name == "keys" {
            self.keys = Some(value);
            return self;
        }
        let name = if name == "count" { "limit" } else { name };
        self.params.retain(|(n, _)| n != name);
        self.params.push((name.to_string(), value));
        self
    }

    pub fn keys<I, V>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.keys = Some(Value::Array(keys.into_iter().map(Into::into).collect()));
        self
    }

    pub fn key(self, key: impl Into<Value>) -> Self {
        self.param("key", key)
    }

    pub fn startkey(self, key: impl Into<Value>) -> Self {
        self.param("startkey", key)
    }

    pub fn endkey(self, key: impl Into<Value>) -> Self {
        self.param("endkey", key)
    }

    pub fn limit(self, n: u64) -> Self {
        self.param("limit", n)
    }

    pub fn skip(self, n: u64) -> Self {
        self.param("skip", n)
    }

    pub fn descending(self, descending: bool) -> Self {
        self.param("descending", descending)
    }

    pub fn include_docs(self, include: bool) -> Self {
        self.param("include_docs", include)
    }

    pub fn reduce(self, reduce: bool) -> Self {
        self.param("reduce", reduce)
    }

    pub fn group(self, group: bool) -> Self {
        self.param("group", group)
    }

    /// Query string with each value JSON-encoded, including the leading `?`
    pub fn to_query(&self) -> String {
        let args: Vec<(&str, String)> = self
            .params
            .iter()
            .map(|(n, v)| (n.as_str(), v.to_string()))
            .collect();
        encode_query(&args)
    }

    /// POST body carrying the key list, if one was given
    pub fn body(&self) -> Option<String> {
        self.keys.as_ref().map(|keys| json!({ "keys": keys }).to_string())
    }
}
