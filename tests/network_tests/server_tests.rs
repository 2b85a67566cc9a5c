//! Tests for the TCP server and connection handling
//!
//! These tests verify:
//! - Request/response over a real socket
//! - Status codes for each error kind
//! - Malformed requests keep the connection open
//! - Many clients at once, idle clients never block busy ones
//! - Connection limit and oversized requests
//! - Graceful shutdown

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use atlasdoc::config::Config;
use atlasdoc::engine::Engine;
use atlasdoc::network::{Server, ShutdownHandle};
use atlasdoc::protocol::{decode_response, Status, MAX_LINE_SIZE};
use atlasdoc::{AtlasError, Client, Filter};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    temp: TempDir,
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    fn start() -> Self {
        Self::with_max_connections(1024)
    }

    fn with_max_connections(max_connections: usize) -> Self {
        let temp = TempDir::new().unwrap();
        let config = Config::builder()
            .data_dir(temp.path())
            .listen_addr("127.0.0.1:0")
            .sync_writes(false)
            .max_connections(max_connections)
            .read_timeout_ms(5000)
            .write_timeout_ms(5000)
            .build();

        let engine = Arc::new(Engine::open(config.clone()).unwrap());
        let server = Server::bind(config, engine).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || server.run().unwrap());

        Self {
            temp,
            addr,
            shutdown,
            thread: Some(thread),
        }
    }

    fn client(&self) -> Client {
        let client = Client::connect(self.addr).unwrap();
        client.set_timeout(Some(Duration::from_secs(5))).unwrap();
        client
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Send a raw line and read back the raw response line
fn raw(stream: &mut TcpStream, reader: &mut BufReader<TcpStream>, line: &str) -> String {
    stream.write_all(line.as_bytes()).unwrap();
    stream.write_all(b"\n").unwrap();
    let mut response = String::new();
    reader.read_line(&mut response).unwrap();
    response
}

/// Open a socket and wait until the server is serving it
fn connect_served(addr: SocketAddr) -> (TcpStream, BufReader<TcpStream>) {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());
    let pong = raw(&mut stream, &mut reader, "PING");
    assert!(pong.starts_with("200"));
    (stream, reader)
}

fn status_of(err: &AtlasError) -> u16 {
    match err {
        AtlasError::Server { status, .. } => *status,
        other => panic!("Expected server error, got {:?}", other),
    }
}

// =============================================================================
// Basic Tests
// =============================================================================

#[test]
fn test_ping() {
    let server = TestServer::start();
    let mut client = server.client();

    client.ping().unwrap();
}

#[test]
fn test_full_document_lifecycle() {
    let server = TestServer::start();
    let mut client = server.client();

    client.create_collection("users").unwrap();
    assert_eq!(client.list_collections().unwrap(), vec!["users".to_string()]);

    let created = client
        .put_document("users", "alice", json!({"name": "Alice", "age": 30}))
        .unwrap();
    let updated = client.put_document("users", "alice", json!({"age": 31})).unwrap();
    assert_eq!(updated["uuid"], created["uuid"]);
    assert_eq!(updated["name"], json!("Alice"));
    assert_eq!(updated["age"], json!(31));

    assert_eq!(client.get_document("users", "alice").unwrap(), updated);
    assert_eq!(client.list_documents("users").unwrap(), vec!["alice".to_string()]);

    client.delete_document("users", "alice").unwrap();
    assert!(client.list_documents("users").unwrap().is_empty());

    client.delete_collection("users").unwrap();
    assert!(client.list_collections().unwrap().is_empty());
}

#[test]
fn test_filter_over_network() {
    let server = TestServer::start();
    let mut client = server.client();

    client.create_collection("c").unwrap();
    client.put_document("c", "d1", json!({"x": 1, "y": "a"})).unwrap();
    client.put_document("c", "d2", json!({"x": 1, "y": "b"})).unwrap();
    client.put_document("c", "d3", json!({"x": 2, "y": "a"})).unwrap();

    let docs = client
        .filter_documents("c", Filter::from_value(json!({"x": 1})).unwrap())
        .unwrap();
    assert_eq!(docs.len(), 2);

    let docs = client
        .filter_documents("c", Filter::from_value(json!({"x": 1, "y": "a"})).unwrap())
        .unwrap();
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0]["y"], json!("a"));
}

// =============================================================================
// Error Status Tests
// =============================================================================

#[test]
fn test_error_statuses() {
    let server = TestServer::start();
    let mut client = server.client();

    let err = client.get_document("missing", "d").unwrap_err();
    assert_eq!(status_of(&err), 404);
    assert!(err.is_not_found());

    client.create_collection("c").unwrap();
    assert_eq!(status_of(&client.create_collection("c").unwrap_err()), 400);
    assert_eq!(status_of(&client.create_collection("..").unwrap_err()), 400);
    assert_eq!(
        status_of(&client.put_document("c", "d", json!([1, 2])).unwrap_err()),
        400
    );
    assert_eq!(status_of(&client.delete_document("c", "nope").unwrap_err()), 404);
    assert_eq!(status_of(&client.delete_collection("nope").unwrap_err()), 404);
}

#[test]
fn test_corrupt_document_is_500_without_paths() {
    let server = TestServer::start();
    let mut client = server.client();
    client.create_collection("c").unwrap();
    std::fs::write(server.temp.path().join("c").join("bad"), b"{oops").unwrap();

    let err = client.get_document("c", "bad").unwrap_err();

    assert_eq!(status_of(&err), 500);
    let text = err.to_string();
    assert!(!text.contains(&*server.temp.path().to_string_lossy()));
}

#[test]
fn test_malformed_request_keeps_connection() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    let bad = raw(&mut stream, &mut reader, "BOGUS thing");
    let bad = decode_response(&bad).unwrap();
    assert_eq!(bad.status, Status::BadRequest);

    let bad = raw(&mut stream, &mut reader, "PUT c d not-json");
    assert_eq!(decode_response(&bad).unwrap().status, Status::BadRequest);

    let ok = raw(&mut stream, &mut reader, "PING");
    assert_eq!(ok.trim_end(), r#"200 "PONG""#);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_many_clients_same_document() {
    let server = TestServer::start();
    server.client().create_collection("c").unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let addr = server.addr;
            thread::spawn(move || {
                let mut client = Client::connect(addr).unwrap();
                for j in 0..5 {
                    let mut payload = serde_json::Map::new();
                    payload.insert(format!("c{}_{}", i, j), json!(true));
                    client
                        .put_document("c", "shared", serde_json::Value::Object(payload))
                        .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let doc = server.client().get_document("c", "shared").unwrap();
    // 40 written keys + uuid
    assert_eq!(doc.len(), 41);
}

#[test]
fn test_idle_clients_do_not_block_others() {
    let server = TestServer::start();
    let _idle: Vec<_> = (0..8).map(|_| connect_served(server.addr)).collect();

    let mut client = server.client();
    client.ping().unwrap();
    client.create_collection("c").unwrap();
    client.put_document("c", "d", json!({"a": 1})).unwrap();
}

#[test]
fn test_connection_limit_rejects_extra_clients() {
    let server = TestServer::with_max_connections(1);
    let mut held = server.client();
    held.ping().unwrap();

    let mut extra = TcpStream::connect(server.addr).unwrap();
    extra.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
    let mut line = String::new();
    BufReader::new(&mut extra).read_line(&mut line).unwrap();
    let response = decode_response(&line).unwrap();
    assert_eq!(response.status, Status::Error);
    assert_eq!(response.error_message(), Some("server busy"));

    // The slot frees up once the first client leaves
    drop(held);
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if server.client().ping().is_ok() {
            break;
        }
        assert!(Instant::now() < deadline, "slot never released");
        thread::sleep(Duration::from_millis(20));
    }
}

#[test]
fn test_oversized_request_is_rejected_and_closed() {
    let server = TestServer::start();
    let mut stream = TcpStream::connect(server.addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    let mut reader = BufReader::new(stream.try_clone().unwrap());

    stream.write_all(&vec![b'a'; MAX_LINE_SIZE + 1]).unwrap();

    let mut line = String::new();
    reader.read_line(&mut line).unwrap();
    assert_eq!(decode_response(&line).unwrap().status, Status::BadRequest);

    let mut rest = Vec::new();
    assert_eq!(reader.read_to_end(&mut rest).unwrap(), 0);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_shutdown_closes_idle_connections() {
    let mut server = TestServer::start();
    let (_stream, mut reader) = connect_served(server.addr);

    let started = Instant::now();
    server.shutdown.shutdown();
    server.thread.take().unwrap().join().unwrap();

    // Well under the 5s read timeout: the server closed the socket itself
    assert!(started.elapsed() < Duration::from_secs(4));
    let mut rest = Vec::new();
    assert_eq!(reader.read_to_end(&mut rest).unwrap(), 0);
}

#[test]
fn test_shutdown_stops_accept_loop() {
    let mut server = TestServer::start();
    server.client().ping().unwrap();

    server.shutdown.shutdown();
    server.thread.take().unwrap().join().unwrap();

    // Listener is gone with the server
    assert!(Client::connect(server.addr)
        .and_then(|mut c| c.ping())
        .is_err());
}

#[test]
fn test_bind_rejects_invalid_config() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .data_dir(temp.path())
        .listen_addr("127.0.0.1:0")
        .max_connections(0)
        .build();
    let engine = Arc::new(Engine::open_path(temp.path()).unwrap());

    assert!(matches!(
        Server::bind(config, engine),
        Err(AtlasError::Config(_))
    ));
}
