// Transport Session Tests
// Echo round trips over loopback TCP and UDP, the simulated non-IP
// link, and the timeout/peer-closed error mapping

use lightlink::config::{EndpointConfig, SocketKind, TransportScheme};
use lightlink::transport::{
    CellularConfig, CellularInterface, EthernetInterface, NetworkInterface, TransportError,
    TransportSession,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, UdpSocket};

const FRAME: &[u8] = b"t:lights;g:001;s:1;\0";

fn loopback_config(kind: SocketKind, port: u16) -> EndpointConfig {
    EndpointConfig::new("127.0.0.1", port, TransportScheme::Ethernet, kind)
        .with_socket_timeout(Duration::from_millis(500))
        .with_pacing(Duration::ZERO)
}

async fn spawn_udp_echo() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 1024];
        while let Ok((len, from)) = socket.recv_from(&mut buf).await {
            let _ = socket.send_to(&buf[..len], from).await;
        }
    });
    addr
}

async fn spawn_tcp_echo() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 1024];
                while let Ok(len) = stream.read(&mut buf).await {
                    if len == 0 || stream.write_all(&buf[..len]).await.is_err() {
                        break;
                    }
                }
            });
        }
    });
    addr
}

// ============================================================================
// UDP DATAGRAM
// ============================================================================

#[tokio::test]
async fn test_udp_echo_round_trip() {
    let server = spawn_udp_echo().await;
    let config = loopback_config(SocketKind::Udp, server.port());
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    assert!(session.is_connected());

    session.send(FRAME, Some(server)).await.unwrap();

    let mut buf = [0u8; 1024];
    let (len, from) = session.receive(&mut buf).await.unwrap();
    assert_eq!(&buf[..len], FRAME);
    assert_eq!(from, Some(server));
}

#[tokio::test]
async fn test_udp_send_requires_destination() {
    let server = spawn_udp_echo().await;
    let config = loopback_config(SocketKind::Udp, server.port());
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    let err = session.send(FRAME, None).await.unwrap_err();
    assert!(matches!(err, TransportError::InvalidAddress(_)));
}

#[tokio::test]
async fn test_udp_receive_times_out_against_silent_peer() {
    let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let peer = silent.local_addr().unwrap();

    let config =
        loopback_config(SocketKind::Udp, peer.port()).with_socket_timeout(Duration::from_millis(150));
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    session.send(FRAME, Some(peer)).await.unwrap();

    let mut buf = [0u8; 1024];
    let err = session.receive(&mut buf).await.unwrap_err();
    assert!(err.is_timeout());

    drop(silent);
}

#[tokio::test]
async fn test_connect_is_not_supported_on_datagram_sockets() {
    let server = spawn_udp_echo().await;
    let config = loopback_config(SocketKind::Udp, server.port());
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    let err = session.connect(server).await.unwrap_err();
    assert!(matches!(err, TransportError::Unsupported(_)));
}

// ============================================================================
// TCP STREAM
// ============================================================================

#[tokio::test]
async fn test_tcp_echo_round_trip() {
    let server = spawn_tcp_echo().await;
    let config = loopback_config(SocketKind::Tcp, server.port());
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    assert!(!session.is_connected());

    session.connect(server).await.unwrap();
    assert!(session.is_connected());

    // Stream sends use the connected peer implicitly.
    session.send(FRAME, None).await.unwrap();

    let mut buf = [0u8; 1024];
    let (len, from) = session.receive(&mut buf).await.unwrap();
    assert_eq!(&buf[..len], FRAME);
    assert_eq!(from, None);
}

#[tokio::test]
async fn test_tcp_send_before_connect_fails() {
    let server = spawn_tcp_echo().await;
    let config = loopback_config(SocketKind::Tcp, server.port());
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    let err = session.send(FRAME, None).await.unwrap_err();
    assert!(matches!(err, TransportError::NotConnected));
}

#[tokio::test]
async fn test_tcp_peer_close_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let server = listener.local_addr().unwrap();
    tokio::spawn(async move {
        // Accept and immediately hang up.
        if let Ok((stream, _)) = listener.accept().await {
            drop(stream);
        }
    });

    let config = loopback_config(SocketKind::Tcp, server.port());
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    session.connect(server).await.unwrap();

    let mut buf = [0u8; 1024];
    let err = session.receive(&mut buf).await.unwrap_err();
    assert!(matches!(err, TransportError::PeerClosed));
}

#[tokio::test]
async fn test_tcp_connect_to_dead_port_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead = listener.local_addr().unwrap();
    drop(listener);

    let config = loopback_config(SocketKind::Tcp, dead.port());
    let iface = EthernetInterface::new();

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    let err = session.connect(dead).await.unwrap_err();
    assert!(err.is_connection_error() || err.is_timeout());
}

// ============================================================================
// NON-IP DATAGRAM
// ============================================================================

#[tokio::test]
async fn test_non_ip_link_echo_round_trip() {
    let iface = CellularInterface::new(CellularConfig::new("internet"));
    let config = EndpointConfig::new(
        "unused",
        0,
        TransportScheme::Cellular4gLte,
        SocketKind::CellularNonIp,
    )
    .with_socket_timeout(Duration::from_millis(500));

    let mut session = TransportSession::open(&config, &iface).await.unwrap();
    assert!(session.is_connected());

    // No addresses anywhere on the non-IP path.
    session.send(FRAME, None).await.unwrap();

    let mut buf = [0u8; 1024];
    let (len, from) = session.receive(&mut buf).await.unwrap();
    assert_eq!(&buf[..len], FRAME);
    assert_eq!(from, None);
}

#[tokio::test]
async fn test_ethernet_has_no_non_ip_link() {
    let iface = EthernetInterface::new();
    let err = iface.open_non_ip().await.unwrap_err();
    assert!(matches!(err, TransportError::Unsupported(_)));
}
