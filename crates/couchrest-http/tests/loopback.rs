//! End-to-end tests against a one-shot HTTP server on the loopback interface.

use std::sync::Arc;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use couchrest_core::{Adapter, CollectionDescriptor, CollectionOptions, Criteria, DocumentTransport};
use couchrest_http::HttpTransport;

// ─── Helpers ──────────────────────────────────────────────────────────────────

struct Captured {
    head: String,
    body: String,
}

/// Accept one connection, answer with `status` and `body`, report what came in.
async fn serve_once(status: &'static str, body: String) -> (u16, oneshot::Receiver<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };
        let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
        let content_length = head
            .lines()
            .find_map(|l| {
                let (name, value) = l.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        while buf.len() < head_end + content_length {
            let n = socket.read(&mut chunk).await.unwrap();
            buf.extend_from_slice(&chunk[..n]);
        }
        let req_body = String::from_utf8_lossy(&buf[head_end..head_end + content_length]).to_string();

        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
        let _ = tx.send(Captured { head, body: req_body });
    });

    (port, rx)
}

fn adapter_for(port: u16) -> Adapter {
    let adapter = Adapter::new(Arc::new(HttpTransport::with_defaults().unwrap()));
    adapter
        .register_collection(CollectionDescriptor::new("users").with_options(CollectionOptions {
            hostname: Some("127.0.0.1".into()),
            port: Some(port),
            user: Some("admin".into()),
            password: Some("secret".into()),
            ..Default::default()
        }))
        .unwrap();
    adapter
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn find_by_id_over_http() {
    let (port, captured) = serve_once("200 OK", json!({ "_id": "u1", "name": "ann" }).to_string()).await;
    let adapter = adapter_for(port);

    let records = adapter.find("users", Some(Criteria::by_id("u1"))).await.unwrap();
    assert_eq!(records, vec![json!({ "_id": "u1", "name": "ann" })]);

    let captured = captured.await.unwrap();
    assert!(captured.head.starts_with("GET /sails/u1 HTTP/1.1\r\n"), "{}", captured.head);
    assert!(captured.head.to_ascii_lowercase().contains("authorization: basic ywrtaw46c2vjcmv0"));
}

#[tokio::test]
async fn create_sends_json_body() {
    let (port, captured) = serve_once("201 Created", json!({ "ok": true, "id": "u9" }).to_string()).await;
    let adapter = adapter_for(port);

    let mut payload = serde_json::Map::new();
    payload.insert("name".into(), json!("ann"));
    let out = adapter.create("users", payload).await.unwrap();
    assert_eq!(out.into_record().unwrap()["id"], "u9");

    let captured = captured.await.unwrap();
    assert!(captured.head.starts_with("POST /sails HTTP/1.1\r\n"), "{}", captured.head);
    assert!(captured.head.to_ascii_lowercase().contains("content-type: application/json"));
    let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
    assert_eq!(sent, json!({ "name": "ann", "type": "users" }));
}

#[tokio::test]
async fn not_found_over_http_is_empty() {
    let (port, _captured) = serve_once("404 Not Found", json!({ "error": "not_found" }).to_string()).await;
    let adapter = adapter_for(port);

    let records = adapter.find("users", Some(Criteria::by_id("nope"))).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn connection_refused_is_a_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let adapter = adapter_for(port);
    let err = adapter.find("users", None).await.unwrap_err();
    assert!(err.is_transport(), "{err}");
}

#[tokio::test]
async fn close_is_a_noop() {
    let transport = HttpTransport::with_defaults().unwrap();
    assert!(transport.close().await.is_ok());
}
