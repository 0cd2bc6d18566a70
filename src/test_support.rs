//! Local HTTP server for exercising the network paths in tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

type Handler = dyn Fn(&str) -> (u16, Vec<u8>) + Send + Sync;

/// A one-response-per-connection HTTP/1.1 server bound to `127.0.0.1:0`.
///
/// The handler receives the request head (request line plus headers) and returns a
/// status code and body.
pub(crate) struct StubServer {
    base_url: String,
    hits: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl StubServer {
    pub(crate) async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str) -> (u16, Vec<u8>) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let handler: Arc<Handler> = Arc::new(handler);

        let task = tokio::spawn({
            let hits = Arc::clone(&hits);
            async move {
                loop {
                    let Ok((mut socket, _)) = listener.accept().await else {
                        break;
                    };
                    let handler = Arc::clone(&handler);
                    let hits = Arc::clone(&hits);
                    tokio::spawn(async move {
                        let mut buf = Vec::new();
                        let mut chunk = [0u8; 1024];
                        while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                            match socket.read(&mut chunk).await {
                                Ok(0) | Err(_) => break,
                                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                            }
                        }
                        hits.fetch_add(1, Ordering::SeqCst);

                        let head = String::from_utf8_lossy(&buf).into_owned();
                        let (status, body) = handler(&head);
                        let header = format!(
                            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                            status,
                            if status < 400 { "OK" } else { "Error" },
                            body.len()
                        );
                        let _ = socket.write_all(header.as_bytes()).await;
                        let _ = socket.write_all(&body).await;
                        let _ = socket.shutdown().await;
                    });
                }
            }
        });

        Self { base_url, hits, task }
    }

    /// Server base URL, e.g. `http://127.0.0.1:12345`.
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of requests served so far.
    pub(crate) fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Path and query of the request line, e.g. `/furniture?per_page=100&page=2`.
pub(crate) fn request_target(head: &str) -> &str {
    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("")
}

/// Value of a query parameter in the request line.
pub(crate) fn query_param<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    let (_, query) = request_target(head).split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Value of a request header, matched case-insensitively.
pub(crate) fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
}
