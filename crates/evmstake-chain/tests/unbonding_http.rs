//! Integration test of the HTTP unbonding source against a local responder.
//!
//! Run with: cargo test --test unbonding_http -- --nocapture

use evmstake_chain::{ChainError, HttpUnbondingSource, UnbondingQuery, fetch_unbonding};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Serve one HTTP response, then report the request line.
async fn serve_once(status: &'static str, body: &'static str) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 4096];
        let n = socket.read(&mut buf).await.unwrap();
        let request = String::from_utf8_lossy(&buf[..n]).to_string();
        let request_line = request.lines().next().unwrap_or_default().to_string();

        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        let _ = socket.shutdown().await;
        let _ = tx.send(request_line);
    });

    (base, rx)
}

fn query(api_url: String) -> UnbondingQuery {
    UnbondingQuery::new(Some("0xabc".to_string()), Some(api_url))
}

#[tokio::test]
async fn fetches_entries_in_server_order() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("evmstake_chain=debug")
        .try_init();

    let body = r#"[
        {"transactionHash":"0x02","amount":"2.5","unbondingCompletionBlock":20,"unbondingCompletionTimestamp":1700000200},
        {"transactionHash":"0x01","amount":1.25,"unbondingCompletionBlock":10,"unbondingCompletionTimestamp":1700000100}
    ]"#;
    let (base, request) = serve_once("200 OK", body).await;
    let source = HttpUnbondingSource::new().unwrap();

    let entries = fetch_unbonding(&source, &query(base)).await.unwrap();

    assert_eq!(
        request.await.unwrap(),
        "GET /delegators/0xabc/unbonding_delegations HTTP/1.1"
    );
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].transaction_hash, "0x02");
    assert_eq!(entries[0].amount, 2.5);
    assert_eq!(entries[1].completion_block, 10);
}

#[tokio::test]
async fn null_body_is_empty() {
    let (base, _request) = serve_once("200 OK", "null").await;
    let source = HttpUnbondingSource::new().unwrap();

    let entries = fetch_unbonding(&source, &query(base)).await.unwrap();
    assert!(entries.is_empty());
}

#[tokio::test]
async fn server_error_is_reported() {
    let (base, _request) = serve_once("500 Internal Server Error", "{}").await;
    let source = HttpUnbondingSource::new().unwrap();

    let err = fetch_unbonding(&source, &query(base)).await.unwrap_err();
    assert!(matches!(err, ChainError::HttpStatus { status: 500, .. }));
}
