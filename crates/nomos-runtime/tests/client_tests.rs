//! RPC client tests against an in-process protocol server

use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use prost::Message;
use tokio::net::TcpListener;
use tokio_util::codec::{Framed, LengthDelimitedCodec};

use nomos_runtime::proto::{self, request, response};
use nomos_runtime::{Error, RpcClient};

/// Serve the protocol from a fixed data tree; optionally answer with a
/// corrupted response id.
async fn spawn_server(wrong_ids: bool) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let data: serde_json::Value = serde_json::json!({"db": {"host": "db.internal"}});
        while let Ok((stream, _)) = listener.accept().await {
            let mut framed = Framed::new(stream, LengthDelimitedCodec::new());
            while let Some(Ok(frame)) = framed.next().await {
                let request = proto::Request::decode(frame.freeze()).unwrap();
                let id = if wrong_ids { request.id + 100 } else { request.id };
                let body = match request.body.unwrap() {
                    request::Body::Health(_) => response::Body::Health(proto::HealthResponse {
                        status: "ok".into(),
                    }),
                    request::Body::Initialize(init) => {
                        assert!(!init.alias.is_empty());
                        response::Body::Initialize(proto::InitializeResponse {
                            capabilities: vec!["get".into()],
                            errors: vec![],
                        })
                    }
                    request::Body::Get(get) => {
                        if get.path == ["db".to_string(), "host".to_string()] {
                            response::Body::Get(proto::GetResponse {
                                value_json: "\"db.internal\"".into(),
                                error: String::new(),
                            })
                        } else if get.path.last().map(String::as_str) == Some("*") {
                            response::Body::Get(proto::GetResponse {
                                value_json: data.to_string(),
                                error: String::new(),
                            })
                        } else {
                            response::Body::Get(proto::GetResponse {
                                value_json: String::new(),
                                error: format!("no value at {}", get.path.join(".")),
                            })
                        }
                    }
                    request::Body::List(_) => response::Body::List(proto::ListResponse {
                        keys: vec!["db".into()],
                    }),
                    request::Body::Shutdown(_) => {
                        let envelope = proto::Response {
                            id,
                            body: Some(response::Body::Shutdown(proto::ShutdownResponse {})),
                        };
                        let _ = framed.send(Bytes::from(envelope.encode_to_vec())).await;
                        return;
                    }
                };
                let envelope = proto::Response { id, body: Some(body) };
                framed
                    .send(Bytes::from(envelope.encode_to_vec()))
                    .await
                    .unwrap();
            }
        }
    });
    addr
}

async fn connect(addr: SocketAddr) -> RpcClient {
    RpcClient::connect("test", addr, Duration::from_secs(5))
        .await
        .unwrap()
}

#[tokio::test]
async fn health_initialize_get_list_round_trip() {
    let addr = spawn_server(false).await;
    let client = connect(addr).await;

    assert_eq!(client.health().await.unwrap().status, "ok");

    let init = client
        .initialize("test", "{\"region\":\"eu\"}".into())
        .await
        .unwrap();
    assert_eq!(init.capabilities, vec!["get".to_string()]);
    assert!(init.errors.is_empty());

    let get = client
        .get(vec!["db".into(), "host".into()])
        .await
        .unwrap();
    assert_eq!(get.value_json, "\"db.internal\"");
    assert!(get.error.is_empty());

    let list = client.list().await.unwrap();
    assert_eq!(list.keys, vec!["db".to_string()]);
}

#[tokio::test]
async fn wildcard_returns_whole_tree() {
    let addr = spawn_server(false).await;
    let client = connect(addr).await;
    let get = client.get(vec!["*".into()]).await.unwrap();
    let value: serde_json::Value = serde_json::from_str(&get.value_json).unwrap();
    assert_eq!(value["db"]["host"], "db.internal");
}

#[tokio::test]
async fn provider_side_errors_come_back_in_band() {
    let addr = spawn_server(false).await;
    let client = connect(addr).await;
    let get = client.get(vec!["missing".into()]).await.unwrap();
    assert!(get.value_json.is_empty());
    assert!(get.error.contains("missing"));
}

#[tokio::test]
async fn mismatched_response_id_is_a_protocol_error() {
    let addr = spawn_server(true).await;
    let client = connect(addr).await;
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "got {err:?}");
}

#[tokio::test]
async fn concurrent_callers_share_one_connection() {
    let addr = spawn_server(false).await;
    let client = std::sync::Arc::new(connect(addr).await);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let client = std::sync::Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client.get(vec!["db".into(), "host".into()]).await.unwrap()
        }));
    }
    for handle in handles {
        assert_eq!(handle.await.unwrap().value_json, "\"db.internal\"");
    }
}

#[tokio::test]
async fn closed_connection_surfaces_as_an_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // accept and immediately drop the socket
        let _ = listener.accept().await;
    });
    let client = RpcClient::connect("test", addr, Duration::from_secs(1))
        .await
        .unwrap();
    let err = client.health().await.unwrap_err();
    assert!(
        matches!(err, Error::ConnectionClosed { .. } | Error::Io(_)),
        "got {err:?}"
    );
}
