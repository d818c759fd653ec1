use policy_simulation_client::{
    ClientConfig, FailureKind, HttpTransport, RunOutcome, SimulationClient, SimulationTransport,
};
use serde_json::{json, Value};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    sync::oneshot,
};

/// Serves exactly one HTTP exchange and hands back the raw request.
async fn serve_once(status_line: &'static str, body: String) -> (String, oneshot::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0_u8; 4096];
        loop {
            let read = socket.read(&mut buf).await.unwrap();
            if read == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..read]);
            if request_complete(&raw) {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        let _ = tx.send(String::from_utf8_lossy(&raw).into_owned());
    });
    (base, rx)
}

fn request_complete(raw: &[u8]) -> bool {
    let text = String::from_utf8_lossy(raw);
    let Some(split) = text.find("\r\n\r\n") else {
        return false;
    };
    let length = text[..split]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    raw.len() >= split + 4 + length
}

fn config_for(base: &str) -> ClientConfig {
    ClientConfig {
        api_base: base.to_string(),
        ..ClientConfig::default()
    }
}

#[tokio::test]
async fn posts_json_to_simulation_endpoint() {
    let body = json!({
        "simulation_id": "sim-http",
        "results": { "metrics": { "congestion_score": 0.7 }, "impact_predictions": {} }
    })
    .to_string();
    let (base, request) = serve_once("200 OK", body).await;
    let client = SimulationClient::from_config(&config_for(&base)).unwrap();

    let outcome = client
        .run("Congestion charge", true, Some(policy_simulation_client::Region::new("Delhi")))
        .await;
    assert!(outcome.is_success());

    let raw = request.await.unwrap();
    assert!(raw.starts_with("POST /simulation/simulate HTTP/1.1"));
    let sent: Value = serde_json::from_str(raw.split("\r\n\r\n").nth(1).unwrap()).unwrap();
    assert_eq!(
        sent,
        json!({
            "policy_text": "Congestion charge",
            "enable_optimization": true,
            "region": { "state": "Delhi" }
        })
    );
}

#[tokio::test]
async fn non_success_status_is_a_server_failure() {
    let (base, _request) = serve_once(
        "500 Internal Server Error",
        json!({ "detail": "model offline" }).to_string(),
    )
    .await;
    let transport = HttpTransport::from_config(&config_for(&base)).unwrap();
    let err = transport.submit(json!({})).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Server);
    assert_eq!(err.to_string(), "request failed with status code 500");
}

#[tokio::test]
async fn invalid_json_body_fails_closed() {
    let (base, _request) = serve_once("200 OK", "<html>oops</html>".to_string()).await;
    let client = SimulationClient::from_config(&config_for(&base)).unwrap();
    match client.run("Bus priority", false, None).await {
        RunOutcome::Failed(message) => assert!(message.starts_with("malformed simulation response")),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let transport = HttpTransport::from_config(&config_for(&base)).unwrap();
    let err = transport.submit(json!({})).await.unwrap_err();
    assert_eq!(err.kind(), FailureKind::Transport);
}
