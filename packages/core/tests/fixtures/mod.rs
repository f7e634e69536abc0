//! Test fixtures: an in-process stand-in for the chat API.
//!
//! The reply depends on `agent_id`, so one server covers every outcome:
//!
//! | agent_id  | response                                      |
//! |-----------|-----------------------------------------------|
//! | `sarah`   | 200 JSON `{ response, agent_name }`           |
//! | `alex`    | 404                                           |
//! | `maya`    | 422                                           |
//! | `jordan`  | 500                                           |
//! | `priya`   | 200 plain text                                |
//! | `teapot`  | 418                                           |
//! | `blank`   | 200 JSON with an empty `response`             |
//! | `echo`    | 200 JSON whose `response` is the request body |
//! | `slow`    | 200 JSON after 2 seconds                      |
//! | `quota`   | 200 JSON with an `error` and a null `response`|
//!
//! [`TruncatedServer`] is a raw TCP stand-in whose body always breaks off.

#![allow(dead_code)]

use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};

pub const SLOW_REPLY: Duration = Duration::from_secs(2);

/// Chat API test server bound to an ephemeral local port
pub struct TestServer {
    addr: std::net::SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let app = Router::new().route("/api/chat", post(chat));

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server failed");
        });

        Self { addr, handle }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/api/chat", self.addr)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn chat(Json(body): Json<Value>) -> Response {
    let agent = body["agent_id"].as_str().unwrap_or_default().to_string();
    match agent.as_str() {
        "sarah" => Json(json!({
            "response": format!("Hi! You said: {}", body["message"].as_str().unwrap_or_default()),
            "agent_name": "Sarah Chen",
        }))
        .into_response(),
        "alex" => (StatusCode::NOT_FOUND, "agent not found").into_response(),
        "maya" => (StatusCode::UNPROCESSABLE_ENTITY, "bad payload").into_response(),
        "jordan" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "priya" => "Plain text works too.".into_response(),
        "teapot" => (StatusCode::IM_A_TEAPOT, "short and stout").into_response(),
        "blank" => Json(json!({ "response": "" })).into_response(),
        "echo" => Json(json!({ "response": body.to_string() })).into_response(),
        "quota" => Json(json!({ "error": "quota exceeded", "response": null })).into_response(),
        "slow" => {
            tokio::time::sleep(SLOW_REPLY).await;
            Json(json!({ "response": "finally" })).into_response()
        }
        _ => (StatusCode::NOT_FOUND, "unknown agent").into_response(),
    }
}

/// Answers every request with `status` and a body cut off before its declared
/// length, so the status arrives but reading the body fails.
pub struct TruncatedServer {
    addr: std::net::SocketAddr,
    handle: JoinHandle<()>,
}

impl TruncatedServer {
    pub async fn start(status: u16) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read local addr");

        let handle = tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    read_request(&mut socket).await;
                    let head = format!(
                        "HTTP/1.1 {status} Broken\r\ncontent-type: text/plain\r\ncontent-length: 64\r\n\r\npartial"
                    );
                    let _ = socket.write_all(head.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { addr, handle }
    }

    pub fn endpoint(&self) -> String {
        format!("http://{}/api/chat", self.addr)
    }
}

impl Drop for TruncatedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Consume one request: headers plus `content-length` bytes of body.
async fn read_request(socket: &mut TcpStream) {
    let mut received = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        received.extend_from_slice(&chunk[..n]);

        let Some(head_end) = received.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&received[..head_end]).to_ascii_lowercase();
        let length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if received.len() >= head_end + 4 + length {
            return;
        }
    }
}
