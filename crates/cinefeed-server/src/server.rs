//! Unix domain socket server that wraps a `CinefeedDB` handle.
//!
//! Each connected client sends JSON-line requests and receives JSON-line
//! responses, one per request and in order. Reads are answered on the
//! connection's task. Writes wait on a journal fsync, so they run on the
//! blocking pool instead of an async worker.

use std::path::PathBuf;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::OwnedWriteHalf;
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, error, info, warn};

use cinefeed_core::api::CinefeedDB;
use cinefeed_core::error::Error as CoreError;
use cinefeed_core::schema;

use crate::protocol::{Request, Response};

/// A cinefeed server listening on a Unix socket.
pub struct CinefeedServer {
    db: CinefeedDB,
    socket_path: PathBuf,
}

impl CinefeedServer {
    pub fn new(db: CinefeedDB, socket_path: PathBuf) -> Self {
        Self { db, socket_path }
    }

    /// Serve until SIGINT or SIGTERM.
    ///
    /// A stale socket file from an earlier run is replaced; the socket file
    /// is removed again on shutdown.
    pub async fn run(&self) -> std::io::Result<()> {
        if self.socket_path.exists() {
            std::fs::remove_file(&self.socket_path)?;
        }
        let listener = UnixListener::bind(&self.socket_path)?;
        info!(path = %self.socket_path.display(), "server listening");

        tokio::select! {
            _ = self.accept_connections(&listener) => {}
            _ = shutdown_signal() => info!("shutdown signal received"),
        }

        match std::fs::remove_file(&self.socket_path) {
            Ok(()) => info!(path = %self.socket_path.display(), "socket file removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(error = %e, "failed to remove socket file on shutdown"),
        }
        Ok(())
    }

    async fn accept_connections(&self, listener: &UnixListener) {
        loop {
            let stream = match listener.accept().await {
                Ok((stream, _addr)) => stream,
                Err(e) => {
                    error!(error = %e, "accept error");
                    continue;
                }
            };
            let db = self.db.clone();
            tokio::spawn(async move {
                if let Err(e) = serve_connection(db, stream).await {
                    warn!(error = %e, "connection closed with error");
                }
            });
        }
    }
}

async fn serve_connection(db: CinefeedDB, stream: UnixStream) -> std::io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(line) {
            Ok(req) => answer(&db, req).await,
            Err(e) => Response::error("ParseError", e.to_string()),
        };
        send(&mut writer, &response).await?;
    }
    Ok(())
}

/// Answer one request, moving writes onto the blocking pool.
async fn answer(db: &CinefeedDB, req: Request) -> Response {
    if !req.is_write() {
        return dispatch(db, req);
    }
    let db = db.clone();
    tokio::task::spawn_blocking(move || dispatch(&db, req))
        .await
        .unwrap_or_else(|e| {
            error!(error = %e, "write task failed");
            Response::error("InternalError", e.to_string())
        })
}

async fn send(writer: &mut OwnedWriteHalf, response: &Response) -> std::io::Result<()> {
    let mut bytes = serde_json::to_vec(response).unwrap_or_else(|e| {
        serde_json::json!({"error": "InternalError", "message": e.to_string()})
            .to_string()
            .into_bytes()
    });
    bytes.push(b'\n');
    writer.write_all(&bytes).await?;
    writer.flush().await
}

fn dispatch(db: &CinefeedDB, req: Request) -> Response {
    execute(db, req).unwrap_or_else(|e| {
        let kind = e.kind();
        debug!(kind = kind.as_str(), error = %e, "request failed");
        Response::error(kind.as_str(), e.to_string())
    })
}

fn execute(db: &CinefeedDB, req: Request) -> Result<Response, CoreError> {
    let schema = schema::lookup(req.entity())?;

    let response = match req {
        Request::Get { id, .. } => Response::ok_item(db.get(schema, &id)?),
        Request::List {
            limit,
            sort,
            after,
            before,
            ..
        } => {
            let mut list = db.list(schema).cursors(after, before);
            if let Some(n) = limit {
                list = list.limit(n);
            }
            if let Some(sort) = sort {
                list = list.sort(sort);
            }
            let page = list.execute()?;
            Response::ok_page(page.data, page.meta)
        }
        Request::Create { data, .. } => Response::ok_item(db.create(schema, data)?),
        Request::Update { id, data, .. } => Response::ok_item(db.update(schema, &id, data)?),
        Request::Delete { id, .. } => Response::ok_item(db.delete(schema, &id)?),
    };
    Ok(response)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "failed to register SIGTERM handler");
                ctrl_c.await.ok();
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
    }
}
