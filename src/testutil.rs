//! In-memory document backend served through wiremock, for tests.

use crate::tools::dtos::Document;
use crate::{Client, Config};
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use wiremock::matchers::any;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

pub(crate) const APP_ID: &str = "test-app";
pub(crate) const CLIENT_KEY: &str = "test-key";

#[derive(Default)]
struct State {
    collections: HashMap<String, Vec<Document>>,
    next_id: u64,
}

/// A tiny document store that speaks the client's wire format.
///
/// Queries match on top-level field equality; sort applies its keys in order.
#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    state: Arc<Mutex<State>>,
}

impl FakeBackend {
    /// Documents currently stored in `collection`.
    pub fn documents(&self, collection: &str) -> Vec<Document> {
        let state = self.state.lock().unwrap();
        state.collections.get(collection).cloned().unwrap_or_default()
    }

    fn authorized(request: &Request) -> bool {
        let header_ok = request
            .headers
            .get("X-Application-Id")
            .and_then(|v| v.to_str().ok())
            == Some(APP_ID)
            && request
                .headers
                .get("X-Application-Client-Key")
                .and_then(|v| v.to_str().ok())
                == Some(CLIENT_KEY);

        let params: HashMap<String, String> = request.url.query_pairs().into_owned().collect();
        let params_ok = params.get("appId").map(String::as_str) == Some(APP_ID)
            && params.get("appClientKey").map(String::as_str) == Some(CLIENT_KEY);

        header_ok || params_ok
    }

    fn insert(&self, collection: &str, mut doc: Document) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("{:024x}", state.next_id);
        doc.insert("_id".to_string(), json!(id));
        state
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
        id
    }

    fn find(&self, collection: &str, params: &Document) -> Vec<Document> {
        let query = object_param(params, "query");
        let sort = object_param(params, "sort");
        let skip = number_param(params, "skip").unwrap_or(0) as usize;
        let limit = number_param(params, "limit").map(|n| n as usize);

        let mut docs: Vec<Document> = self
            .documents(collection)
            .into_iter()
            .filter(|d| matches(d, &query))
            .collect();

        docs.sort_by(|a, b| {
            for (field, direction) in &sort {
                let ord = compare(a.get(field), b.get(field));
                let ord = if direction.as_i64() == Some(-1) { ord.reverse() } else { ord };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            Ordering::Equal
        });

        docs.into_iter()
            .skip(skip)
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    fn update_by_id(&self, collection: &str, id: &str, update: &Document) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(doc) = state
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d["_id"] == json!(id)))
        else {
            return false;
        };
        for (k, v) in update {
            doc.insert(k.clone(), v.clone());
        }
        true
    }

    fn update_many(&self, collection: &str, params: &Document, update: &Document) -> Value {
        let query = object_param(params, "query");
        let multi = flag_param(params, "multi");

        let matched = {
            let mut state = self.state.lock().unwrap();
            let docs = state.collections.entry(collection.to_string()).or_default();
            let mut matched = 0u64;
            for doc in docs.iter_mut().filter(|d| matches(d, &query)) {
                for (k, v) in update {
                    doc.insert(k.clone(), v.clone());
                }
                matched += 1;
                if !multi {
                    break;
                }
            }
            matched
        };

        if matched == 0 && flag_param(params, "upsert") {
            let mut doc = query.clone();
            for (k, v) in update {
                doc.insert(k.clone(), v.clone());
            }
            let id = self.insert(collection, doc);
            return json!({"n": 0, "nModified": 0, "upserted": id});
        }

        json!({"n": matched, "nModified": matched})
    }

    fn delete_by_id(&self, collection: &str, id: &str) -> bool {
        let mut state = self.state.lock().unwrap();
        let Some(docs) = state.collections.get_mut(collection) else {
            return false;
        };
        let before = docs.len();
        docs.retain(|d| d["_id"] != json!(id));
        docs.len() != before
    }

    fn delete_many(&self, collection: &str, params: &Document) -> u64 {
        let query = object_param(params, "query");
        let multi = flag_param(params, "multi");

        let mut state = self.state.lock().unwrap();
        let Some(docs) = state.collections.get_mut(collection) else {
            return 0;
        };

        let mut deleted = 0u64;
        docs.retain(|d| {
            if (multi || deleted == 0) && matches(d, &query) {
                deleted += 1;
                false
            } else {
                true
            }
        });
        deleted
    }
}

impl Respond for FakeBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        if !Self::authorized(request) {
            return ResponseTemplate::new(401).set_body_json(json!({"message": "bad credentials"}));
        }

        // The first segment is the API version prefix of the base URL.
        let segments: Vec<String> = request
            .url
            .path_segments()
            .map(|s| s.skip(1).map(str::to_string).collect())
            .unwrap_or_default();
        let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

        let body: Document = serde_json::from_slice(&request.body).unwrap_or_default();
        let params: Document = request
            .url
            .query_pairs()
            .map(|(k, v)| {
                let value = serde_json::from_str(&v).unwrap_or(Value::String(v.to_string()));
                (k.to_string(), value)
            })
            .collect();

        match (request.method.as_str(), segments.as_slice()) {
            ("POST", [collection]) => {
                let id = self.insert(collection, body);
                ResponseTemplate::new(201).set_body_json(json!({"objectId": id}))
            }
            ("POST", [collection, "query"]) => {
                ResponseTemplate::new(200).set_body_json(self.find(collection, &body))
            }
            ("GET", [collection, "count"]) => {
                let count = self.find(collection, &params).len();
                ResponseTemplate::new(200).set_body_json(json!({"count": count}))
            }
            ("POST", [collection, "count", "query"]) => {
                let count = self.find(collection, &body).len();
                ResponseTemplate::new(200).set_body_json(json!({"count": count}))
            }
            ("GET", [collection]) => {
                ResponseTemplate::new(200).set_body_json(self.find(collection, &params))
            }
            ("GET", [collection, id]) => {
                match self
                    .documents(collection)
                    .into_iter()
                    .find(|d| d["_id"] == json!(id))
                {
                    Some(doc) => ResponseTemplate::new(200).set_body_json(doc),
                    None => not_found(),
                }
            }
            ("PUT", [collection]) => {
                ResponseTemplate::new(200).set_body_json(self.update_many(collection, &params, &body))
            }
            ("PUT", [collection, id]) => {
                if self.update_by_id(collection, id, &body) {
                    ResponseTemplate::new(204)
                } else {
                    not_found()
                }
            }
            ("DELETE", [collection]) => {
                let deleted = self.delete_many(collection, &params);
                ResponseTemplate::new(200).set_body_json(json!({"deleted": deleted}))
            }
            ("DELETE", [collection, id]) => {
                if self.delete_by_id(collection, id) {
                    ResponseTemplate::new(204)
                } else {
                    not_found()
                }
            }
            _ => ResponseTemplate::new(405),
        }
    }
}

fn not_found() -> ResponseTemplate {
    ResponseTemplate::new(404).set_body_json(json!({"message": "object not found"}))
}

fn object_param(params: &Document, key: &str) -> Document {
    params
        .get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

fn number_param(params: &Document, key: &str) -> Option<u64> {
    params.get(key).and_then(Value::as_u64)
}

fn flag_param(params: &Document, key: &str) -> bool {
    params.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn matches(doc: &Document, query: &Document) -> bool {
    query.iter().all(|(k, v)| doc.get(k) == Some(v))
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Starts a fake backend and a client configured against it under `/v1`.
pub(crate) async fn start() -> (MockServer, FakeBackend, Arc<Client>) {
    let server = MockServer::start().await;
    let backend = FakeBackend::default();

    Mock::given(any())
        .respond_with(backend.clone())
        .mount(&server)
        .await;

    let client = Client::new(Config::new(
        &format!("{}/v1", server.uri()),
        APP_ID,
        CLIENT_KEY,
    ))
    .unwrap();

    (server, backend, client)
}

/// Builds a document from a `json!` object literal.
pub(crate) fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}
