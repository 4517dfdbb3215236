mod common;

use common::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use video_range_server::server::{self, ConnectionSettings};

struct RunningServer {
    addr: SocketAddr,
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
    _root: tempfile::TempDir,
}

async fn start_server() -> RunningServer {
    start_server_with(media_root(), ConnectionSettings::default()).await
}

async fn start_server_with(root: tempfile::TempDir, settings: ConnectionSettings) -> RunningServer {
    let state = state_for(root.path());
    let listener = server::create_listener("127.0.0.1:0".parse().unwrap()).unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Notify::new());

    let task = tokio::spawn(server::serve(
        listener,
        server::video_app(state),
        settings,
        Arc::clone(&shutdown),
        Duration::from_secs(1),
    ));

    RunningServer {
        addr,
        shutdown,
        task,
        _root: root,
    }
}

/// Raw HTTP/1.1 response split into lowercase-named headers and body
struct RawResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl RawResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

async fn send(addr: SocketAddr, request_head: &str) -> RawResponse {
    send_after(addr, request_head, Duration::ZERO).await
}

/// Like `send`, but waits `delay` between writing the request and reading
async fn send_after(addr: SocketAddr, request_head: &str, delay: Duration) -> RawResponse {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request_head.as_bytes()).await.unwrap();
    tokio::time::sleep(delay).await;

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();

    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("end of response head");
    let head = String::from_utf8(raw[..split].to_vec()).unwrap();
    let body = raw[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status = lines
        .next()
        .and_then(|l| l.split(' ').nth(1))
        .and_then(|s| s.parse().ok())
        .expect("status line");
    let headers = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(n, v)| (n.trim().to_ascii_lowercase(), v.trim().to_string()))
        .collect();

    RawResponse {
        status,
        headers,
        body,
    }
}

fn request(path: &str, extra: &str) -> String {
    format!("GET {path} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n{extra}\r\n")
}

#[tokio::test]
async fn range_request_over_the_wire() {
    let srv = start_server().await;
    let resp = send(srv.addr, &request("/clip.mp4", "Range: bytes=0-99\r\n")).await;

    assert_eq!(resp.status, 206);
    assert_eq!(resp.header("content-type"), Some("video/mp4"));
    assert_eq!(resp.header("content-range"), Some("bytes 0-99/1000"));
    assert_eq!(resp.header("content-length"), Some("100"));
    assert_eq!(resp.body, &sample_bytes(1000)[..100]);
    srv.task.abort();
}

#[tokio::test]
async fn always_on_headers_on_every_response() {
    let srv = start_server().await;

    for (path, extra, status) in [
        ("/clip.mp4", "", 200),
        ("/clip.mp4", "Range: bytes=10-19\r\n", 206),
        ("/notes.txt", "", 200),
        ("/", "", 200),
        ("/season", "", 301),
        ("/clip.mp4", "Range: bytes=x-\r\n", 400),
        ("/missing", "", 404),
        ("/clip.mp4", "Range: bytes=5000-\r\n", 416),
    ] {
        let resp = send(srv.addr, &request(path, extra)).await;
        assert_eq!(resp.status, status, "{path} {extra:?}");
        assert_eq!(resp.header("accept-ranges"), Some("bytes"), "{path}");
        assert_eq!(
            resp.header("access-control-allow-origin"),
            Some("*"),
            "{path}"
        );
        assert_eq!(resp.header("server"), Some("test-server"), "{path}");
    }
    srv.task.abort();
}

#[tokio::test]
async fn method_not_allowed_still_finalized() {
    let srv = start_server().await;
    let resp = send(
        srv.addr,
        "DELETE /clip.mp4 HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;

    assert_eq!(resp.status, 405);
    assert_eq!(resp.header("accept-ranges"), Some("bytes"));
    assert_eq!(resp.header("access-control-allow-origin"), Some("*"));
    srv.task.abort();
}

#[tokio::test]
async fn shutdown_stops_accept_loop() {
    let srv = start_server().await;
    let resp = send(srv.addr, &request("/notes.txt", "")).await;
    assert_eq!(resp.body, b"hello notes");

    srv.shutdown.notify_one();
    tokio::time::timeout(Duration::from_secs(5), srv.task)
        .await
        .expect("server stops after shutdown")
        .unwrap();
}

#[tokio::test]
async fn slow_reader_receives_whole_video() {
    const SIZE: usize = 16 * 1024 * 1024;
    let root = media_root();
    std::fs::write(root.path().join("big.mp4"), sample_bytes(SIZE)).unwrap();
    let settings = ConnectionSettings {
        keep_alive: true,
        header_read_timeout: Some(Duration::from_secs(1)),
    };
    let srv = start_server_with(root, settings).await;

    let resp = send_after(srv.addr, &request("/big.mp4", ""), Duration::from_millis(1500)).await;

    assert_eq!(resp.status, 200);
    assert_eq!(resp.header("content-length"), Some("16777216"));
    assert_eq!(resp.body.len(), SIZE);
    assert!(resp.body == sample_bytes(SIZE));
    srv.task.abort();
}

#[tokio::test]
async fn silent_client_is_disconnected() {
    let settings = ConnectionSettings {
        keep_alive: true,
        header_read_timeout: Some(Duration::from_millis(200)),
    };
    let srv = start_server_with(media_root(), settings).await;

    let mut stream = TcpStream::connect(srv.addr).await.unwrap();
    let mut raw = Vec::new();
    let closed = tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut raw)).await;
    assert!(closed.is_ok(), "connection should be closed by the server");
    srv.task.abort();
}
