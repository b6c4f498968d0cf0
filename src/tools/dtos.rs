//! Data Transfer Objects (DTOs)

use serde::{Deserialize, Serialize};

/// A JSON document: string keys mapped to JSON values.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// Filter criteria in the server's query language.
pub type Query = Document;

/// Field name to direction (`1` ascending, `-1` descending), in order.
pub type Sort = Document;

/// A decoded response together with the HTTP status it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn new(status: u16, data: T) -> Self {
        Self { status, data }
    }

    /// Maps the decoded data, keeping the status.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            data: f(self.data),
        }
    }
}

/// What the server reported about a multi-document update.
///
/// Each field is `None` when the response body did not carry it. Fields are
/// read independently, so one malformed field does not hide the others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdateSummary {
    pub matched: Option<u64>,
    pub modified: Option<u64>,
    pub upserted_id: Option<ObjectId>,
}

impl<'de> Deserialize<'de> for UpdateSummary {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self {
            matched: first_count(&value, &["matched", "n", "matchedCount"]),
            modified: first_count(&value, &["modified", "nModified", "modifiedCount"]),
            upserted_id: ["upserted_id", "upserted", "upsertedId"]
                .iter()
                .find_map(|key| value.get(key).and_then(object_id_from)),
        })
    }
}

/// What the server reported about a multi-document delete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub deleted: Option<u64>,
}

impl<'de> Deserialize<'de> for DeleteSummary {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(Self {
            deleted: first_count(&value, &["deleted", "n", "deletedCount"]),
        })
    }
}

/// The first of `keys` holding an unsigned integer.
fn first_count(value: &serde_json::Value, keys: &[&str]) -> Option<u64> {
    keys.iter()
        .find_map(|key| value.get(key).and_then(serde_json::Value::as_u64))
}

/// Reads an id from a string, `{"$oid": ..}`, or the legacy
/// `[{"index": 0, "_id": ..}]` list, where the first entry wins.
fn object_id_from(value: &serde_json::Value) -> Option<ObjectId> {
    match value {
        serde_json::Value::String(id) => Some(ObjectId::Plain(id.clone())),
        serde_json::Value::Object(map) => match map.get("$oid") {
            Some(serde_json::Value::String(oid)) => Some(ObjectId::Extended { oid: oid.clone() }),
            _ => map.get("_id").and_then(object_id_from),
        },
        serde_json::Value::Array(items) => items.first().and_then(object_id_from),
        _ => None,
    }
}

/// An object id as sent by the server: either a plain string or
/// extended JSON of the form `{"$oid": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectId {
    Plain(String),
    Extended {
        #[serde(rename = "$oid")]
        oid: String,
    },
}

impl ObjectId {
    pub fn as_str(&self) -> &str {
        match self {
            ObjectId::Plain(id) => id,
            ObjectId::Extended { oid } => oid,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            ObjectId::Plain(id) => id,
            ObjectId::Extended { oid } => oid,
        }
    }
}

/// Body of a successful insert.
#[derive(Debug, Deserialize)]
pub(crate) struct InsertedObject {
    #[serde(rename = "objectId", alias = "_id", alias = "id")]
    pub object_id: ObjectId,
}

/// Body of a list read: a bare array or an envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ObjectList {
    Bare(Vec<Document>),
    Envelope {
        #[serde(alias = "objects")]
        results: Vec<Document>,
    },
}

impl ObjectList {
    pub fn into_documents(self) -> Vec<Document> {
        match self {
            ObjectList::Bare(docs) | ObjectList::Envelope { results: docs } => docs,
        }
    }
}

/// Body of a count read: a bare number or `{"count": n}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ObjectCount {
    Bare(u64),
    Envelope { count: u64 },
}

impl ObjectCount {
    pub fn value(&self) -> u64 {
        match *self {
            ObjectCount::Bare(n) | ObjectCount::Envelope { count: n } => n,
        }
    }
}
