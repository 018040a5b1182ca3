//! Framed RPC client over a local TCP connection
//!
//! One length-delimited frame carries one protobuf envelope. The framed
//! transport sits behind an async mutex: concurrent callers serialise on
//! the frame, which keeps request/response pairing trivial and is safe for
//! any number of tasks sharing the client.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use prost::Message;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use crate::error::{Error, Result};
use crate::proto::{self, request, response};

/// Default per-call timeout
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct RpcClient {
    alias: String,
    framed: Mutex<Framed<TcpStream, LengthDelimitedCodec>>,
    next_id: AtomicU64,
    call_timeout: Duration,
}

impl RpcClient {
    /// Dial the provider's announced port on the loopback interface.
    pub async fn connect(alias: &str, addr: SocketAddr, call_timeout: Duration) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| Error::ConnectFailed {
                alias: alias.to_string(),
                addr,
                source,
            })?;
        Ok(Self {
            alias: alias.to_string(),
            framed: Mutex::new(Framed::new(stream, LengthDelimitedCodec::new())),
            next_id: AtomicU64::new(1),
            call_timeout,
        })
    }

    async fn call(&self, body: request::Body) -> Result<response::Body> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let envelope = proto::Request { id, body: Some(body) };
        let bytes = Bytes::from(envelope.encode_to_vec());

        let mut framed = self.framed.lock().await;
        tokio::time::timeout(self.call_timeout, framed.send(bytes))
            .await
            .map_err(|_| Error::CallTimeout {
                alias: self.alias.clone(),
            })??;
        let frame = tokio::time::timeout(self.call_timeout, framed.next())
            .await
            .map_err(|_| Error::CallTimeout {
                alias: self.alias.clone(),
            })?
            .ok_or_else(|| Error::ConnectionClosed {
                alias: self.alias.clone(),
            })??;
        drop(framed);

        let response = proto::Response::decode(frame.freeze()).map_err(|e| Error::Protocol {
            alias: self.alias.clone(),
            reason: format!("undecodable response: {e}"),
        })?;
        if response.id != id {
            return Err(Error::Protocol {
                alias: self.alias.clone(),
                reason: format!("response id {} does not match request id {id}", response.id),
            });
        }
        response.body.ok_or_else(|| Error::Protocol {
            alias: self.alias.clone(),
            reason: "response envelope has no body".to_string(),
        })
    }

    fn unexpected(&self, wanted: &str) -> Error {
        Error::Protocol {
            alias: self.alias.clone(),
            reason: format!("unexpected response variant, wanted {wanted}"),
        }
    }

    pub async fn health(&self) -> Result<proto::HealthResponse> {
        match self.call(request::Body::Health(proto::HealthRequest {})).await? {
            response::Body::Health(resp) => Ok(resp),
            _ => Err(self.unexpected("health")),
        }
    }

    pub async fn initialize(&self, alias: &str, config_json: String) -> Result<proto::InitializeResponse> {
        let body = request::Body::Initialize(proto::InitializeRequest {
            alias: alias.to_string(),
            config_json,
        });
        match self.call(body).await? {
            response::Body::Initialize(resp) => Ok(resp),
            _ => Err(self.unexpected("initialize")),
        }
    }

    pub async fn get(&self, path: Vec<String>) -> Result<proto::GetResponse> {
        match self.call(request::Body::Get(proto::GetRequest { path })).await? {
            response::Body::Get(resp) => Ok(resp),
            _ => Err(self.unexpected("get")),
        }
    }

    pub async fn list(&self) -> Result<proto::ListResponse> {
        match self.call(request::Body::List(proto::ListRequest {})).await? {
            response::Body::List(resp) => Ok(resp),
            _ => Err(self.unexpected("list")),
        }
    }

    pub async fn shutdown(&self) -> Result<proto::ShutdownResponse> {
        match self.call(request::Body::Shutdown(proto::ShutdownRequest {})).await? {
            response::Body::Shutdown(resp) => Ok(resp),
            _ => Err(self.unexpected("shutdown")),
        }
    }
}

impl std::fmt::Debug for RpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcClient").field("alias", &self.alias).finish()
    }
}
