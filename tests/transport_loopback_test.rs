mod common;

use common::record;
use logstash_adapter::transport::{TcpTransport, TransportOptions, UdpTransport};
use logstash_adapter::{AdapterTransport, AdapterTransports, LogstashAdapter, Route};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::mpsc;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn test_udp_route_delivers_one_datagram_per_record() {
    let listener = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let route = Route::parse(&format!("logstash://127.0.0.1:{port}")).unwrap();
    let mut adapter = LogstashAdapter::new(route, &AdapterTransports::with_defaults())
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(8);
    for message in ["alpha", "beta", "gamma"] {
        tx.send(record(message)).await.unwrap();
    }
    drop(tx);
    adapter.stream(rx).await.unwrap();

    let mut buf = vec![0u8; 65_536];
    let mut received = Vec::new();
    for _ in 0..3 {
        let len = tokio::time::timeout(RECV_TIMEOUT, listener.recv(&mut buf))
            .await
            .expect("datagram not received in time")
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf[..len]).unwrap();
        received.push(value["message"].as_str().unwrap().to_string());
    }

    assert_eq!(received, vec!["alpha", "beta", "gamma"]);
}

#[tokio::test]
async fn test_tcp_route_writes_concatenated_json_objects() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let reader = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut bytes = Vec::new();
        socket.read_to_end(&mut bytes).await.unwrap();
        bytes
    });

    let route = Route::parse(&format!("logstash+tcp://127.0.0.1:{port}?nodelay=true")).unwrap();
    let mut adapter = LogstashAdapter::new(route, &AdapterTransports::with_defaults())
        .await
        .unwrap();

    let (tx, rx) = mpsc::channel(8);
    for message in ["one", "two \"quoted\"", "three"] {
        tx.send(record(message)).await.unwrap();
    }
    drop(tx);
    adapter.stream(rx).await.unwrap();
    drop(adapter);

    let bytes = tokio::time::timeout(RECV_TIMEOUT, reader)
        .await
        .expect("listener did not see EOF")
        .unwrap();

    assert!(!bytes.contains(&b'\n'));
    let messages: Vec<String> = serde_json::Deserializer::from_slice(&bytes)
        .into_iter::<serde_json::Value>()
        .map(|value| value.unwrap()["message"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(messages, vec!["one", "two \"quoted\"", "three"]);
}

#[tokio::test]
async fn test_tcp_dial_to_closed_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();
    drop(listener);

    let result = TcpTransport.dial(&address, &TransportOptions::new()).await;
    let err = result.err().expect("dial should fail");
    assert!(err.is_network());
}

#[tokio::test]
async fn test_udp_dial_rejects_unresolvable_host() {
    let result = UdpTransport
        .dial("no-such-host.invalid:5000", &TransportOptions::new())
        .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_tls_route_without_ca_file_fails_at_construction() {
    let route = Route::parse("logstash+tls://127.0.0.1:6514").unwrap();
    let result = LogstashAdapter::new(route, &AdapterTransports::with_defaults()).await;

    assert!(matches!(
        result,
        Err(logstash_adapter::AdapterError::Dial { .. })
    ));
}
