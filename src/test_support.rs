//! Test doubles: in-process HTTP stubs (each accepted connection gets the next
//! canned response; the raw request is handed back to the test) and a
//! scripted translation backend.
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::translate::TranslationService;

pub struct StubServer {
    pub url: String,
    requests: mpsc::UnboundedReceiver<String>,
}

impl StubServer {
    /// Next raw request (head + body) the stub received.
    pub async fn request(&mut self) -> String {
        self.requests.recv().await.unwrap_or_default()
    }
}

pub async fn serve_once(status: u16, body: &str) -> StubServer {
    serve_sequence(vec![(status, body.to_string())]).await
}

/// Answer one connection per response, in order, then stop listening.
pub async fn serve_sequence(responses: Vec<(u16, String)>) -> StubServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        for (status, body) in responses {
            let Ok((mut stream, _)) = listener.accept().await else {
                return;
            };
            let request = read_request(&mut stream).await;
            let _ = tx.send(request);
            let reply = format!(
                "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = stream.write_all(reply.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });
    StubServer { url, requests: rx }
}

/// URL of a local port nothing is listening on.
pub async fn unused_local_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        if let Some(head_end) = find_head_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
            let body_len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= head_end + 4 + body_len {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

/// Translation backend that answers `ko:<input>` and counts calls.
#[derive(Debug, Default)]
pub struct ScriptedTranslation {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl ScriptedTranslation {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn fail_all(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl TranslationService for ScriptedTranslation {
    async fn translate(&self, text: &str, _source: &str, _target: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            anyhow::bail!("scripted translation failure");
        }
        Ok(format!("ko:{text}"))
    }
}
