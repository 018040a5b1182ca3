//! Test provider speaking the nomos RPC protocol
//!
//! Serves the value tree it is handed at `Initialize` (its `config_json`
//! becomes the data). Used by integration tests to exercise the real
//! subprocess launch path; not installed with the CLI.
//!
//! Environment:
//! - `NOMOS_STUB_UNHEALTHY=1` makes the health probe report a bad status
//! - `NOMOS_STUB_SILENT=1` suppresses the handshake line (handshake tests)

use std::sync::Arc;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use prost::Message;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use nomos_runtime::proto::{self, request, response};

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::io::Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    if std::env::var("NOMOS_STUB_SILENT").is_err() {
        println!("PROVIDER_PORT={port}");
    }
    eprintln!("provider-stub listening on {port}");

    let data: Arc<Mutex<serde_json::Value>> = Arc::new(Mutex::new(serde_json::Value::Null));
    loop {
        let (stream, _) = listener.accept().await?;
        let data = Arc::clone(&data);
        if serve(stream, data).await {
            return Ok(());
        }
    }
}

/// Serve one connection; returns true after a Shutdown request.
async fn serve(stream: TcpStream, data: Arc<Mutex<serde_json::Value>>) -> bool {
    let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
    while let Some(Ok(frame)) = framed.next().await {
        let Ok(request) = proto::Request::decode(frame.freeze()) else {
            return false;
        };
        let Some(body) = request.body else { return false };
        let (body, done) = respond(body, &data).await;
        let envelope = proto::Response {
            id: request.id,
            body: Some(body),
        };
        if framed
            .send(Bytes::from(envelope.encode_to_vec()))
            .await
            .is_err()
        {
            return false;
        }
        if done {
            return true;
        }
    }
    false
}

async fn respond(
    body: request::Body,
    data: &Mutex<serde_json::Value>,
) -> (response::Body, bool) {
    match body {
        request::Body::Health(_) => {
            let status = if std::env::var("NOMOS_STUB_UNHEALTHY").is_ok() {
                "sick"
            } else {
                proto::STATUS_OK
            };
            (
                response::Body::Health(proto::HealthResponse {
                    status: status.to_string(),
                }),
                false,
            )
        }
        request::Body::Initialize(init) => {
            let mut errors = Vec::new();
            match serde_json::from_str(&init.config_json) {
                Ok(value) => *data.lock().await = value,
                Err(e) => errors.push(format!("bad config: {e}")),
            }
            (
                response::Body::Initialize(proto::InitializeResponse {
                    capabilities: vec!["get".into(), "list".into()],
                    errors,
                }),
                false,
            )
        }
        request::Body::Get(get) => {
            let data = data.lock().await;
            let body = match lookup(&data, &get.path) {
                Ok(value) => response::Body::Get(proto::GetResponse {
                    value_json: value.to_string(),
                    error: String::new(),
                }),
                Err(message) => response::Body::Get(proto::GetResponse {
                    value_json: String::new(),
                    error: message,
                }),
            };
            (body, false)
        }
        request::Body::List(_) => {
            let data = data.lock().await;
            let keys = match &*data {
                serde_json::Value::Object(map) => map.keys().cloned().collect(),
                _ => Vec::new(),
            };
            (response::Body::List(proto::ListResponse { keys }), false)
        }
        request::Body::Shutdown(_) => {
            (response::Body::Shutdown(proto::ShutdownResponse {}), true)
        }
    }
}

/// Walk the dotted path: keys into objects, decimal segments into arrays,
/// `*` returns the tree at that point.
fn lookup(data: &serde_json::Value, path: &[String]) -> Result<serde_json::Value, String> {
    let mut current = data;
    for segment in path {
        if segment == "*" {
            break;
        }
        current = match current {
            serde_json::Value::Object(map) => map
                .get(segment)
                .ok_or_else(|| format!("no key `{segment}`"))?,
            serde_json::Value::Array(items) => {
                let index: usize = segment
                    .parse()
                    .map_err(|_| format!("`{segment}` is not a list index"))?;
                items.get(index).ok_or_else(|| format!("index {index} out of range"))?
            }
            _ => return Err(format!("cannot descend into scalar at `{segment}`")),
        };
    }
    Ok(current.clone())
}
