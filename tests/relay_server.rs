//! End-to-end tests against a bound listener, speaking raw HTTP/1.1

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use txtrelay::{ChannelKey, RelayServer, ServerConfig};

struct TestServer {
    addr: std::net::SocketAddr,
    server: std::sync::Arc<RelayServer>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<txtrelay::Result<()>>,
}

async fn start(config: ServerConfig) -> TestServer {
    start_on(std::sync::Arc::new(RelayServer::new(config))).await
}

async fn start_on(server: std::sync::Arc<RelayServer>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop, stopped) = oneshot::channel::<()>();

    let task = {
        let server = std::sync::Arc::clone(&server);
        tokio::spawn(async move {
            server
                .serve(listener, async {
                    let _ = stopped.await;
                })
                .await
        })
    };

    TestServer {
        addr,
        server,
        stop,
        task,
    }
}

/// Open a stream and wait until its sink is attached
async fn open_stream(server: &TestServer, id: &str) -> TcpStream {
    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    let request = format!(
        "GET /api/v2/tunnel/stream?id={} HTTP/1.1\r\nHost: localhost\r\n\r\n",
        id
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let head = read_until(&mut stream, "\r\n\r\n").await;
    assert!(head.starts_with("HTTP/1.1 200"), "{}", head);
    assert!(head.contains("text/event-stream"));

    let key = ChannelKey::default_of(id);
    tokio::time::timeout(Duration::from_secs(5), async {
        while server.server.relay().index().sink_count(&key) == 0 {
            tokio::task::yield_now().await;
        }
    })
    .await
    .unwrap();
    stream
}

async fn request(addr: std::net::SocketAddr, raw: &str) -> String {
    let mut socket = TcpStream::connect(addr).await.unwrap();
    socket.write_all(raw.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    socket.read_to_end(&mut response).await.unwrap();
    String::from_utf8(response).unwrap()
}

fn post(path: &str, body: &str) -> String {
    format!(
        "POST {} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        path,
        body.len(),
        body
    )
}

/// Read from `socket` until `needle` shows up
async fn read_until(socket: &mut TcpStream, needle: &str) -> String {
    let mut seen = String::new();
    let mut buf = [0u8; 1024];
    while !seen.contains(needle) {
        let n = socket.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before {:?}; got {:?}", needle, seen);
        seen.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    seen
}

#[tokio::test]
async fn test_create_stream_send_scenario() {
    let server = start(ServerConfig::default()).await;

    let created = request(server.addr, &post("/api/v2/tunnel/create", r#"{"id":"room1"}"#)).await;
    assert!(created.starts_with("HTTP/1.1 200"), "{}", created);
    assert!(created.ends_with(r#"{"id":"room1"}"#));
    assert!(created.to_lowercase().contains("access-control-allow-origin: *"));

    let again = request(server.addr, &post("/api/v2/tunnel/create", r#"{"id":"room1"}"#)).await;
    assert!(again.starts_with("HTTP/1.1 409"), "{}", again);

    let mut stream = open_stream(&server, "room1").await;
    let key = ChannelKey::default_of("room1");

    let sent = request(
        server.addr,
        &post("/api/v2/tunnel/send", r#"{"id":"room1","content":"hello"}"#),
    )
    .await;
    assert!(sent.starts_with("HTTP/1.1 200"), "{}", sent);

    let body = tokio::time::timeout(Duration::from_secs(5), read_until(&mut stream, "data: hello\n\n"))
        .await
        .unwrap();
    assert!(body.contains("data: hello\n\n"));

    let missing = request(
        server.addr,
        &post("/api/v2/tunnel/send", r#"{"id":"missing-id","content":"x"}"#),
    )
    .await;
    assert!(missing.starts_with("HTTP/1.1 404"), "{}", missing);

    server.stop.send(()).unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .unwrap()
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(server.server.relay().index().sink_count(&key), 0);
}

#[tokio::test]
async fn test_reserved_tunnel_created_at_start() {
    let server = start(ServerConfig::default()).await;

    let response = request(
        server.addr,
        "GET /api/v2/tunnel/checkRoomExists?id=global HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.ends_with(r#"{"exists":true}"#), "{}", response);

    let response = request(
        server.addr,
        "OPTIONS /api/v2/tunnel/create HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);

    server.stop.send(()).unwrap();
    server.task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_server_can_be_served_again() {
    let first = start(ServerConfig::default()).await;
    first.server.relay().create("room1").unwrap();
    first.stop.send(()).unwrap();
    first.task.await.unwrap().unwrap();

    let second = start_on(first.server).await;
    let mut stream = open_stream(&second, "room1").await;

    second
        .server
        .relay()
        .send(&ChannelKey::default_of("room1"), "again")
        .unwrap();

    let body = tokio::time::timeout(
        Duration::from_secs(5),
        read_until(&mut stream, "data: again\n\n"),
    )
    .await
    .unwrap();
    assert!(body.contains("data: again\n\n"));

    second.stop.send(()).unwrap();
    second.task.await.unwrap().unwrap();
}
