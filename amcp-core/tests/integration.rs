//! Integration tests: full command/response exchanges with a scripted
//! server over a real TCP connection on localhost.

use std::time::Duration;

use amcp_core::{
    AmcpConnection, ConnectionInfo, Device, DeviceEvent, EncodedCommand, Locator, MediaItem,
    Operation, OperationKind,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

// ── Helpers ──────────────────────────────────────────────────────

/// Spin up a listener on an OS-assigned port and return the connection
/// info.
async fn ephemeral_listener() -> (TcpListener, ConnectionInfo) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let info = ConnectionInfo::new(addr.ip().to_string(), addr.port());
    (listener, info)
}

/// Answer each received line with the reply scripted for it, in order.
/// Returns every line the client sent.
async fn scripted_server(stream: TcpStream, replies: Vec<&'static str>) -> Vec<String> {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();
    let mut received = Vec::new();
    for reply in replies {
        let Some(line) = lines.next_line().await.unwrap() else {
            break;
        };
        received.push(line);
        write.write_all(reply.as_bytes()).await.unwrap();
    }
    received
}

async fn next_event(rx: &mut mpsc::UnboundedReceiver<DeviceEvent>) -> DeviceEvent {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timeout")
        .expect("event channel closed")
}

async fn drain(device: &mut Device) {
    while !device.is_idle() {
        let alive = tokio::time::timeout(Duration::from_secs(5), device.process_next())
            .await
            .expect("timeout")
            .unwrap();
        assert!(alive, "server hung up early");
    }
}

// ── Exchanges ────────────────────────────────────────────────────

#[tokio::test]
async fn test_media_list_exchange() {
    let (listener, info) = ephemeral_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        scripted_server(
            stream,
            vec![
                "200 CLS OK\r\n\
                 \"AMB\"  MOVIE  6445960 20121101160514 643 1/60\r\n\
                 \"FOLDER\\LOGO\"  STILL  1024 20121101150514\r\n\
                 \r\n",
            ],
        )
        .await
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut device = Device::connect(&info, tx).await.unwrap();
    assert_eq!(
        next_event(&mut rx).await,
        DeviceEvent::ConnectionStateChanged { connected: true }
    );

    device.submit(&Operation::RefreshMedia).await.unwrap();
    drain(&mut device).await;

    assert_eq!(
        next_event(&mut rx).await,
        DeviceEvent::ResponseReceived("200 CLS OK".into())
    );
    assert_eq!(
        next_event(&mut rx).await,
        DeviceEvent::MediaListChanged(vec![
            MediaItem {
                name: "AMB".into(),
                media_type: "MOVIE".into(),
                timecode: "00:00:10:43".into(),
            },
            MediaItem {
                name: "FOLDER/LOGO".into(),
                media_type: "STILL".into(),
                timecode: String::new(),
            },
        ])
    );

    assert_eq!(server.await.unwrap(), ["CLS"]);
}

#[tokio::test]
async fn test_commands_are_serialised_in_order() {
    let (listener, info) = ephemeral_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        scripted_server(
            stream,
            vec![
                "201 VERSION OK\r\n2.0.7.e9fc25a Stable\r\n",
                "200 TLS OK\r\n\"CG\\LOWER-THIRD\" 38572 20130101120000\r\n\r\n",
                "202 PLAY OK\r\n",
            ],
        )
        .await
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut device = Device::connect(&info, tx).await.unwrap();
    next_event(&mut rx).await;

    device.submit(&Operation::ServerVersion).await.unwrap();
    device.submit(&Operation::RefreshTemplates).await.unwrap();
    device
        .submit(&Operation::Play {
            at: Locator::layer(1, 10),
        })
        .await
        .unwrap();
    assert_eq!(device.pending_count(), 2);
    drain(&mut device).await;

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(events.len(), 4);
    assert_eq!(events[0], DeviceEvent::VersionReceived("2.0.7.e9fc25a Stable".into()));
    assert_eq!(events[1], DeviceEvent::ResponseReceived("200 TLS OK".into()));
    assert!(matches!(
        &events[2],
        DeviceEvent::TemplateListChanged(t) if t[0].name == "CG/LOWER-THIRD"
    ));
    assert_eq!(events[3], DeviceEvent::ResponseReceived("202 PLAY OK".into()));

    assert_eq!(server.await.unwrap(), ["VERSION SERVER", "TLS", "PLAY 1-10"]);
}

#[tokio::test]
async fn test_geometry_sends_mipmap_first() {
    let (listener, info) = ephemeral_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        scripted_server(stream, vec!["202 MIXER OK\r\n", "202 MIXER OK\r\n"]).await
    });

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut device = Device::connect(&info, tx).await.unwrap();
    device
        .submit(&Operation::Geometry {
            at: Locator::layer(1, 10),
            rect: amcp_core::Rect::full(),
            tween: None,
            defer: false,
            mipmap: true,
        })
        .await
        .unwrap();
    drain(&mut device).await;

    let sent = server.await.unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0], "MIXER 1-10 MIPMAP 1");
    assert!(sent[1].starts_with("MIXER 1-10 FILL"));
}

#[tokio::test]
async fn test_stream_target_uses_local_address() {
    let (listener, info) = ephemeral_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        scripted_server(stream, vec!["202 ADD OK\r\n"]).await
    });

    let (tx, _rx) = mpsc::unbounded_channel();
    let mut device = Device::connect(&info, tx).await.unwrap();
    device
        .submit(&Operation::StartStream {
            channel: 1,
            port: 9250,
            quality: 23,
            key: false,
            width: 0,
            height: 0,
        })
        .await
        .unwrap();
    drain(&mut device).await;

    let sent = server.await.unwrap();
    assert!(
        sent[0].starts_with("ADD 1 STREAM udp://127.0.0.1:9250 -format mpegts"),
        "{}",
        sent[0]
    );
}

#[tokio::test]
async fn test_server_hangup_is_reported() {
    let (listener, info) = ephemeral_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut device = Device::connect(&info, tx).await.unwrap();
    next_event(&mut rx).await;
    server.await.unwrap();

    let alive = tokio::time::timeout(Duration::from_secs(5), device.process_next())
        .await
        .expect("timeout")
        .unwrap();
    assert!(!alive);
    assert_eq!(
        next_event(&mut rx).await,
        DeviceEvent::ConnectionStateChanged { connected: false }
    );
}

// ── Connection ───────────────────────────────────────────────────

#[tokio::test]
async fn test_raw_connection_roundtrip() {
    let (listener, info) = ephemeral_listener().await;
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        scripted_server(stream, vec!["200 INFO OK\r\n1 1080i5000 PLAYING\r\n\r\n"]).await
    });

    let mut conn = AmcpConnection::connect(&info).await.unwrap();
    assert!(conn.local_address().is_some());
    conn.send(EncodedCommand::new(OperationKind::RefreshChannels, "INFO"))
        .await
        .unwrap();

    let frame = tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .expect("timeout")
        .expect("recv returned None");
    assert_eq!(frame.lines(), ["200 INFO OK", "1 1080i5000 PLAYING"]);
    assert_eq!(server.await.unwrap(), ["INFO"]);
}

#[tokio::test]
async fn test_connect_to_closed_port_fails() {
    let (listener, info) = ephemeral_listener().await;
    drop(listener);
    assert!(AmcpConnection::connect(&info).await.is_err());
}
