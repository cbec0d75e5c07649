//! Client library for connecting to a `cinefeed-server` via Unix socket.
//!
//! Each method serializes a JSON-line request, sends it, reads a JSON-line
//! response, and returns the parsed result.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::UnixStream;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};

use cinefeed_core::api::{Page, PageMeta};
use cinefeed_core::types::{Record, SortDirection};

use crate::error::ClientError;
use crate::protocol::{ErrorResponse, Request};

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Optional arguments of a `list` call.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub limit: Option<i64>,
    pub sort: Option<SortDirection>,
    pub after: Option<String>,
    pub before: Option<String>,
}

impl ListOptions {
    pub fn limit(mut self, n: i64) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn sort(mut self, sort: SortDirection) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn after(mut self, cursor: impl Into<String>) -> Self {
        self.after = Some(cursor.into());
        self
    }

    pub fn before(mut self, cursor: impl Into<String>) -> Self {
        self.before = Some(cursor.into());
        self
    }
}

/// Client for a cinefeed server.
pub struct CinefeedClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line_buf: String,
}

impl CinefeedClient {
    /// Connect to a cinefeed server at the given Unix socket path.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let stream = UnixStream::connect(path.as_ref()).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            line_buf: String::new(),
        })
    }

    /// Get a record by id.
    pub async fn get(&mut self, entity: &str, id: &str) -> Result<Record> {
        let resp = self
            .send_request(&Request::Get {
                entity: entity.to_string(),
                id: id.to_string(),
            })
            .await?;
        item_from_response(resp)
    }

    /// List one page of records.
    pub async fn list(&mut self, entity: &str, options: ListOptions) -> Result<Page> {
        let resp = self
            .send_request(&Request::List {
                entity: entity.to_string(),
                limit: options.limit,
                sort: options.sort,
                after: options.after,
                before: options.before,
            })
            .await?;
        page_from_response(resp)
    }

    /// Create a record from `data`.
    pub async fn create(&mut self, entity: &str, data: Value) -> Result<Record> {
        let resp = self
            .send_request(&Request::Create {
                entity: entity.to_string(),
                data,
            })
            .await?;
        item_from_response(resp)
    }

    /// Merge `data` onto an existing record.
    pub async fn update(&mut self, entity: &str, id: &str, data: Value) -> Result<Record> {
        let resp = self
            .send_request(&Request::Update {
                entity: entity.to_string(),
                id: id.to_string(),
                data,
            })
            .await?;
        item_from_response(resp)
    }

    /// Delete a record, returning it as it was.
    pub async fn delete(&mut self, entity: &str, id: &str) -> Result<Record> {
        let resp = self
            .send_request(&Request::Delete {
                entity: entity.to_string(),
                id: id.to_string(),
            })
            .await?;
        item_from_response(resp)
    }

    /// Send a raw line and return the raw response.
    ///
    /// Mostly useful for exercising the server's parse-error path.
    pub async fn send_raw(&mut self, line: &str) -> Result<Value> {
        self.send_line(line.as_bytes().to_vec()).await
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    async fn send_request(&mut self, req: &Request) -> Result<Value> {
        let data = serde_json::to_vec(req).map_err(ClientError::Serialization)?;
        self.send_line(data).await
    }

    async fn send_line(&mut self, mut data: Vec<u8>) -> Result<Value> {
        data.push(b'\n');
        self.writer.write_all(&data).await?;
        self.writer.flush().await?;

        self.line_buf.clear();
        let n = self.reader.read_line(&mut self.line_buf).await?;
        if n == 0 {
            return Err(ClientError::Disconnected);
        }

        let resp: Value =
            serde_json::from_str(self.line_buf.trim()).map_err(ClientError::Serialization)?;
        Ok(resp)
    }
}

// ---------------------------------------------------------------------------
// Response parsing helpers
// ---------------------------------------------------------------------------

fn check_error(resp: &Value) -> Result<()> {
    if let Some(err) = resp.get("error") {
        let error = err.as_str().unwrap_or("Unknown").to_string();
        let message = resp
            .get("message")
            .and_then(|m| m.as_str())
            .unwrap_or("")
            .to_string();
        return Err(ClientError::Server(ErrorResponse { error, message }));
    }
    Ok(())
}

fn take_field<T: DeserializeOwned>(resp: &mut Value, field: &str) -> Result<T> {
    let value = resp
        .get_mut(field)
        .map(Value::take)
        .ok_or_else(|| ClientError::Protocol(format!("response is missing \"{field}\"")))?;
    serde_json::from_value(value).map_err(ClientError::Serialization)
}

fn item_from_response(mut resp: Value) -> Result<Record> {
    check_error(&resp)?;
    take_field(&mut resp, "item")
}

fn page_from_response(mut resp: Value) -> Result<Page> {
    check_error(&resp)?;
    let data: Vec<Record> = take_field(&mut resp, "data")?;
    let meta: PageMeta = take_field(&mut resp, "meta")?;
    Ok(Page { data, meta })
}
