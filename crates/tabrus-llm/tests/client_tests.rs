use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use tabrus_core::config::LlmSettings;
use tabrus_core::types::Direction;
use tabrus_llm::{ContextualTranslator, GlossaryLine, LlmRequest, LlmUnavailable, OllamaClient};

/// Accept one connection, capture the raw request, answer after `delay`.
async fn serve_once(status: &str, body: &str, delay: Duration) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );
    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let request = read_request(&mut socket).await;
        tokio::time::sleep(delay).await;
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        request
    });
    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 { break; }
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf).to_string();
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .find_map(|l| l.to_ascii_lowercase().strip_prefix("content-length:").map(|v| v.trim().parse::<usize>().unwrap_or(0)))
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + content_length { break; }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

fn client(base_url: &str) -> OllamaClient {
    OllamaClient::new(&LlmSettings { base_url: format!("{}/", base_url), model: "test-model".into(), ..Default::default() }).unwrap()
}

fn request<'a>(examples: &'a [(String, String)], glossary: &'a [GlossaryLine], timeout: Duration) -> LlmRequest<'a> {
    LlmRequest { text: "Салам, гъвелчи", direction: Direction::TabRus, examples, glossary, timeout }
}

#[tokio::test]
async fn successful_generation_is_cleaned() {
    let (url, server) = serve_once("200 OK", r#"{"model":"test-model","response":" \"Привет, друг\"\n","done":true}"#, Duration::ZERO).await;
    let c = client(&url);
    let glossary = vec![GlossaryLine { word: "салам".into(), translations: vec!["привет".into()] }];
    let out = c.contextual_translate(request(&[], &glossary, Duration::from_secs(5))).await;
    assert_eq!(out, Ok("Привет, друг".to_string()));

    let raw = server.await.unwrap();
    assert!(raw.starts_with("POST /api/generate "));
    let body: serde_json::Value = serde_json::from_str(&raw[raw.find("\r\n\r\n").unwrap() + 4..]).unwrap();
    assert_eq!(body["model"], "test-model");
    assert_eq!(body["stream"], false);
    assert!(body["prompt"].as_str().unwrap().contains("• салам: привет"));
    assert!((body["options"]["temperature"].as_f64().unwrap() - 0.3).abs() < 1e-6);
}

#[tokio::test]
async fn non_2xx_is_unavailable() {
    let (url, _server) = serve_once("500 Internal Server Error", r#"{"error":"boom"}"#, Duration::ZERO).await;
    let out = client(&url).contextual_translate(request(&[], &[], Duration::from_secs(5))).await;
    assert_eq!(out, Err(LlmUnavailable::Status(500)));
}

#[tokio::test]
async fn malformed_or_empty_reply_is_unavailable() {
    let (url, _s) = serve_once("200 OK", "not json", Duration::ZERO).await;
    assert!(matches!(client(&url).contextual_translate(request(&[], &[], Duration::from_secs(5))).await, Err(LlmUnavailable::Malformed(_))));

    let (url, _s) = serve_once("200 OK", r#"{"done":true}"#, Duration::ZERO).await;
    assert!(matches!(client(&url).contextual_translate(request(&[], &[], Duration::from_secs(5))).await, Err(LlmUnavailable::Malformed(_))));

    let (url, _s) = serve_once("200 OK", r#"{"response":"   "}"#, Duration::ZERO).await;
    assert!(matches!(client(&url).contextual_translate(request(&[], &[], Duration::from_secs(5))).await, Err(LlmUnavailable::Malformed(_))));
}

#[tokio::test]
async fn slow_endpoint_times_out() {
    let (url, _server) = serve_once("200 OK", r#"{"response":"поздно"}"#, Duration::from_secs(3)).await;
    let started = std::time::Instant::now();
    let out = client(&url).contextual_translate(request(&[], &[], Duration::from_millis(200))).await;
    assert_eq!(out, Err(LlmUnavailable::Timeout));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let c = client(&url);
    assert!(matches!(c.contextual_translate(request(&[], &[], Duration::from_secs(5))).await, Err(LlmUnavailable::Transport(_))));
    assert!(!c.is_available().await);
}

#[tokio::test]
async fn availability_probe_hits_tags() {
    let (url, server) = serve_once("200 OK", r#"{"models":[]}"#, Duration::ZERO).await;
    assert!(client(&url).is_available().await);
    assert!(server.await.unwrap().starts_with("GET /api/tags "));
}
