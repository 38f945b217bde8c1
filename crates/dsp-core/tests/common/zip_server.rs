//! Minimal HTTP/1.1 server for integration tests.
//!
//! Answers every GET with a fixed status and body and counts requests, so
//! tests can assert whether a provisioning run touched the network.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

pub struct ZipServer {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl ZipServer {
    /// Number of requests served so far.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serves `body` with 200 OK.
pub fn start(body: Vec<u8>) -> ZipServer {
    start_with_status(body, "200 OK")
}

/// Serves `body` with the given status line (e.g. "404 Not Found").
/// The server runs until the process exits.
pub fn start_with_status(body: Vec<u8>, status: &'static str) -> ZipServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || handle(stream, &body, status, &hits));
        }
    });
    ZipServer {
        url: format!("http://127.0.0.1:{}/pizza_steak_sushi.zip", port),
        hits,
    }
}

/// Announces a large body, sends two bytes, then stalls. For abort tests.
pub fn start_stalled() -> ZipServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_srv = Arc::clone(&hits);
    thread::spawn(move || {
        for mut stream in listener.incoming().flatten() {
            let hits = Arc::clone(&hits_srv);
            thread::spawn(move || {
                let mut buf = [0u8; 8192];
                if !matches!(stream.read(&mut buf), Ok(n) if n > 0) {
                    return;
                }
                hits.fetch_add(1, Ordering::SeqCst);
                let _ = stream.write_all(
                    b"HTTP/1.1 200 OK\r\nContent-Length: 1048576\r\nConnection: close\r\n\r\nPK",
                );
                let _ = stream.flush();
                thread::sleep(std::time::Duration::from_secs(30));
            });
        }
    });
    ZipServer {
        url: format!("http://127.0.0.1:{}/pizza_steak_sushi.zip", port),
        hits,
    }
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], status: &str, hits: &AtomicUsize) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(_) => {}
    }
    hits.fetch_add(1, Ordering::SeqCst);
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/zip\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        body.len()
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(body);
}
