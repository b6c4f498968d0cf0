//! Send options and query parameters

use crate::tools::dtos::{Document, Sort};
use reqwest::Method;
use std::collections::BTreeMap;

/// Options for sending HTTP requests.
#[derive(Debug, Clone)]
pub struct SendOptions {
    /// HTTP method.
    pub method: Method,

    /// Custom headers to send with the request.
    pub headers: BTreeMap<String, String>,

    /// The JSON body of the request.
    pub body: Option<serde_json::Value>,

    /// Query parameters that will be appended to the request URL.
    /// `null` values are skipped; strings are sent verbatim and everything
    /// else is sent as compact JSON.
    pub query: BTreeMap<String, serde_json::Value>,

    /// Path segment to append when the encoded query string is too long for
    /// the URL. The request is then sent as POST with `query` as the JSON body.
    pub query_overflow: Option<String>,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self::get()
    }
}

impl SendOptions {
    fn with_method(method: Method) -> Self {
        Self {
            method,
            headers: BTreeMap::new(),
            body: None,
            query: BTreeMap::new(),
            query_overflow: None,
        }
    }

    /// Creates new SendOptions with GET method.
    pub fn get() -> Self {
        Self::with_method(Method::GET)
    }

    /// Creates new SendOptions with POST method.
    pub fn post() -> Self {
        Self::with_method(Method::POST)
    }

    /// Creates new SendOptions with PUT method.
    pub fn put() -> Self {
        Self::with_method(Method::PUT)
    }

    /// Creates new SendOptions with DELETE method.
    pub fn delete() -> Self {
        Self::with_method(Method::DELETE)
    }

    /// Sets the body of the request.
    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Sets a query parameter.
    pub fn with_query(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.query.insert(key.to_string(), value.into());
        self
    }

    /// Sets a header.
    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    /// Allows the request to fall back to `POST .../{segment}` for long queries.
    pub fn with_query_overflow(mut self, segment: &str) -> Self {
        self.query_overflow = Some(segment.to_string());
        self
    }
}

/// Options for reading a list of documents.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetObjectsOptions {
    /// Ordered field → direction mapping.
    pub sort: Option<Sort>,

    /// Maximum number of documents to return.
    pub limit: Option<u64>,

    /// Number of matching documents to skip.
    pub skip: Option<u64>,
}

impl GetObjectsOptions {
    /// Creates new GetObjectsOptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the whole sort specification.
    pub fn sort(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Appends an ascending sort key.
    pub fn sort_ascending(self, field: &str) -> Self {
        self.sort_by(field, 1)
    }

    /// Appends a descending sort key.
    pub fn sort_descending(self, field: &str) -> Self {
        self.sort_by(field, -1)
    }

    fn sort_by(mut self, field: &str, direction: i32) -> Self {
        self.sort
            .get_or_insert_with(Sort::new)
            .insert(field.to_string(), direction.into());
        self
    }

    /// Sets the maximum number of documents to return.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    pub(crate) fn into_send_options(self, query: Document) -> SendOptions {
        let mut send = SendOptions::get()
            .with_query("query", query)
            .with_query_overflow("query");
        if let Some(sort) = self.sort {
            send.query.insert("sort".to_string(), sort.into());
        }
        if let Some(limit) = self.limit {
            send.query.insert("limit".to_string(), limit.into());
        }
        if let Some(skip) = self.skip {
            send.query.insert("skip".to_string(), skip.into());
        }
        send
    }
}

/// Options for updating every document matching a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateObjectsOptions {
    /// Insert a document built from the query and update when nothing matches.
    pub upsert: bool,

    /// Update every match instead of only the first.
    pub multi: bool,
}

impl UpdateObjectsOptions {
    /// Creates new UpdateObjectsOptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert one document built from the query and changes when nothing matches.
    pub fn upsert(mut self, upsert: bool) -> Self {
        self.upsert = upsert;
        self
    }

    /// Update every matching document instead of only the first.
    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub(crate) fn into_send_options(self, query: Document, update: Document) -> SendOptions {
        let mut send = SendOptions::put()
            .with_query("query", query)
            .with_body(update.into());
        if self.upsert {
            send.query.insert("upsert".to_string(), true.into());
        }
        if self.multi {
            send.query.insert("multi".to_string(), true.into());
        }
        send
    }
}

/// Options for deleting documents matching a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteObjectsOptions {
    /// Delete every match instead of only the first.
    pub multi: bool,
}

impl DeleteObjectsOptions {
    /// Creates new DeleteObjectsOptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Delete every matching document instead of only the first.
    pub fn multi(mut self, multi: bool) -> Self {
        self.multi = multi;
        self
    }

    pub(crate) fn into_send_options(self, query: Document) -> SendOptions {
        let mut send = SendOptions::delete().with_query("query", query);
        if self.multi {
            send.query.insert("multi".to_string(), true.into());
        }
        send
    }
}

/// Serializes query parameters into a URL-encoded query string.
pub fn serialize_query_params(params: &BTreeMap<String, serde_json::Value>) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());

    for (key, value) in params {
        if let Some(s) = prepare_query_param_value(value) {
            serializer.append_pair(key, &s);
        }
    }

    serializer.finish()
}

/// Prepares a query parameter value for URL encoding.
fn prepare_query_param_value(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
