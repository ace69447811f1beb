use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::codec::AmcpCodec;
use crate::encoder::EncodedCommand;
use crate::error::AmcpError;
use crate::network::resolve_ip_address;
use crate::response::ResponseFrame;

/// Port a playout server listens on for AMCP unless configured otherwise.
pub const DEFAULT_PORT: u16 = 5250;

const CHANNEL_CAPACITY: usize = 100;

/// An AMCP connection to a single playout server.
#[derive(Debug)]
pub struct AmcpConnection {
    // Commands to the background writer task
    tx: mpsc::Sender<EncodedCommand>,
    // Frames from the background reader task
    rx: mpsc::Receiver<ResponseFrame>,
    local_address: Option<IpAddr>,
}

impl AmcpConnection {
    /// Wrap an established stream. `local_address` replaces the client
    /// address placeholder of streaming commands.
    pub fn new<S>(stream: S, local_address: Option<IpAddr>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut net_writer, mut net_reader) = Framed::new(stream, AmcpCodec::new()).split();

        // User -> Network
        let (user_tx, mut network_rx) = mpsc::channel::<EncodedCommand>(CHANNEL_CAPACITY);

        // Network -> User
        let (network_tx, user_rx) = mpsc::channel(CHANNEL_CAPACITY);

        let address = local_address.map(|ip| match ip {
            IpAddr::V4(v4) => v4.to_string(),
            IpAddr::V6(v6) => format!("[{v6}]"),
        });
        tokio::spawn(async move {
            while let Some(command) = network_rx.recv().await {
                let command = match &address {
                    Some(address) => command.with_client_address(address),
                    None => command,
                };
                debug!(kind = %command.kind(), line = command.line(), "sending command");
                match net_writer.send(command).await {
                    Ok(()) => {}
                    // Nothing reached the socket; the stream is still usable.
                    Err(e @ AmcpError::Encoding(_)) => warn!(error = %e, "command not written"),
                    Err(e) => {
                        warn!(error = %e, "network write failed");
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            while let Some(result) = net_reader.next().await {
                match result {
                    Ok(frame) => {
                        debug!(header = frame.header().unwrap_or_default(), "frame received");
                        if network_tx.send(frame).await.is_err() {
                            // receiver dropped
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "network read failed");
                        break;
                    }
                }
            }
        });

        Self {
            tx: user_tx,
            rx: user_rx,
            local_address,
        }
    }

    /// Resolve the host and open a TCP connection.
    pub async fn connect(info: &ConnectionInfo) -> Result<Self, AmcpError> {
        let ip = resolve_ip_address(info.host())
            .await
            .ok_or_else(|| AmcpError::Unresolved(info.host().to_string()))?;
        let stream = TcpStream::connect((ip, info.port())).await?;
        stream.set_nodelay(true)?;
        let local = stream.local_addr()?.ip();
        debug!(server = %info, %local, "connected");
        Ok(Self::new(stream, Some(local)))
    }

    /// Queue a command for the writer task.
    pub async fn send(&self, command: EncodedCommand) -> Result<(), AmcpError> {
        self.tx.send(command).await?;
        Ok(())
    }

    /// Next frame from the server, `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<ResponseFrame> {
        self.rx.recv().await
    }

    /// This end's address as seen on the socket.
    pub fn local_address(&self) -> Option<IpAddr> {
        self.local_address
    }
}

// ── ConnectionInfo ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    host: String,
    port: u16,
}

impl ConnectionInfo {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// `host` or `host:port`; the port defaults to [`DEFAULT_PORT`].
impl FromStr for ConnectionInfo {
    type Err = AmcpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (host, port) = match s.rsplit_once(':') {
            Some((host, port)) if !host.contains(':') => {
                let port = port
                    .parse()
                    .map_err(|_| AmcpError::Other(format!("invalid port in {s:?}")))?;
                (host, port)
            }
            _ => (s, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(AmcpError::Other(format!("missing host in {s:?}")));
        }
        Ok(Self::new(host, port))
    }
}
