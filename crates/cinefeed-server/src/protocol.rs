//! Wire protocol: JSON-over-newlines request/response types.
//!
//! Each request is a single JSON line; each response is a single JSON line.

use cinefeed_core::api::PageMeta;
use cinefeed_core::types::{Record, SortDirection};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request from a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Get {
        entity: String,
        id: String,
    },
    List {
        entity: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        limit: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sort: Option<SortDirection>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<String>,
    },
    Create {
        entity: String,
        data: Value,
    },
    Update {
        entity: String,
        id: String,
        data: Value,
    },
    Delete {
        entity: String,
        id: String,
    },
}

impl Request {
    /// The entity name the request addresses, as sent by the client.
    pub fn entity(&self) -> &str {
        match self {
            Request::Get { entity, .. }
            | Request::List { entity, .. }
            | Request::Create { entity, .. }
            | Request::Update { entity, .. }
            | Request::Delete { entity, .. } => entity,
        }
    }

    /// Whether the request mutates the store (and so may wait on the journal).
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Request::Create { .. } | Request::Update { .. } | Request::Delete { .. }
        )
    }
}

/// A response sent back to the client.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ok(OkResponse),
    Error(ErrorResponse),
}

/// Successful response variants.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum OkResponse {
    Item {
        ok: bool,
        item: Record,
    },
    Page {
        ok: bool,
        data: Vec<Record>,
        meta: PageMeta,
    },
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl Response {
    pub fn ok_item(item: Record) -> Self {
        Response::Ok(OkResponse::Item { ok: true, item })
    }

    pub fn ok_page(data: Vec<Record>, meta: PageMeta) -> Self {
        Response::Ok(OkResponse::Page {
            ok: true,
            data,
            meta,
        })
    }

    pub fn error(error: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error(ErrorResponse {
            error: error.into(),
            message: message.into(),
        })
    }
}
