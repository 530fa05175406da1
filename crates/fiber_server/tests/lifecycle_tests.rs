//! Integration tests for the server lifecycle manager.
//!
//! Readiness polling is exercised against a minimal in-process HTTP
//! responder so the status sequence can be scripted.

use std::net::TcpListener as StdTcpListener;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use fiber_server::{
    find_available_port, launch, server_url, wait_until_ready, write_port_config, LaunchSpec,
    ServerError,
};

/// Serve scripted HTTP statuses: `failures` responses of 500, then 200s.
async fn spawn_scripted_server(failures: usize) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        let mut served = 0usize;
        loop {
            let (mut stream, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => break,
            };
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;

            let status = if served < failures {
                "500 Internal Server Error"
            } else {
                "200 OK"
            };
            served += 1;

            let response = format!(
                "HTTP/1.1 {}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
                status
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
    });

    port
}

#[tokio::test]
async fn test_find_available_port_skips_occupied() {
    // Hold a port open; the probe must step past it
    let occupied = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let taken = occupied.local_addr().unwrap().port();

    let port = find_available_port(taken, 10).await.unwrap();
    assert_ne!(port, taken);
    assert!(port > taken);
    assert!(port < taken + 10);
}

#[tokio::test]
async fn test_port_exhaustion_is_a_dedicated_error() {
    let occupied = StdTcpListener::bind("127.0.0.1:0").unwrap();
    let taken = occupied.local_addr().unwrap().port();

    let result = find_available_port(taken, 1).await;
    assert!(matches!(
        result,
        Err(ServerError::PortExhausted { start, attempts: 1 }) if start == taken
    ));
}

#[tokio::test]
async fn test_ready_on_first_healthy_response() {
    let port = spawn_scripted_server(0).await;
    let ready = wait_until_ready(&server_url(port), 3, Duration::from_millis(10)).await;
    assert!(ready);
}

#[tokio::test]
async fn test_ready_on_final_attempt() {
    // 500 for 29 probes, 200 on the 30th: the budget exactly covers it
    let port = spawn_scripted_server(29).await;
    let ready = wait_until_ready(&server_url(port), 30, Duration::from_millis(10)).await;
    assert!(ready);
}

#[tokio::test]
async fn test_not_ready_when_budget_one_short() {
    let port = spawn_scripted_server(29).await;
    let ready = wait_until_ready(&server_url(port), 29, Duration::from_millis(10)).await;
    assert!(!ready);
}

#[tokio::test]
async fn test_not_ready_when_nothing_listens() {
    // Find a port that is actually free, then probe it without a server
    let free = find_available_port(49152, 100).await.unwrap();
    let ready = wait_until_ready(&server_url(free), 2, Duration::from_millis(10)).await;
    assert!(!ready);
}

#[tokio::test]
async fn test_launch_failure_is_surfaced() {
    let dir = tempfile::tempdir().unwrap();
    let spec = LaunchSpec {
        program: "fiberforge-no-such-binary".to_string(),
        args: vec![],
        cwd: dir.path().to_path_buf(),
    };

    let result = launch(&spec, 5173);
    assert!(matches!(result, Err(ServerError::LaunchFailed(_))));
}

#[cfg(unix)]
#[tokio::test]
async fn test_launch_detaches_process() {
    let dir = tempfile::tempdir().unwrap();
    let spec = LaunchSpec {
        program: "true".to_string(),
        args: vec![],
        cwd: dir.path().to_path_buf(),
    };

    let handle = launch(&spec, 5173).unwrap();
    assert_eq!(handle.port, 5173);
    assert!(!handle.ready);
}

#[test]
fn test_write_port_config() {
    let dir = tempfile::tempdir().unwrap();
    write_port_config(dir.path(), 5181).unwrap();

    let config = std::fs::read_to_string(dir.path().join("vite.config.js")).unwrap();
    assert!(config.contains("port: 5181"));
}
