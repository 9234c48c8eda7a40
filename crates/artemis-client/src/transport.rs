//! TCP transport for Artemis servers.
//!
//! `connect` opens the socket and splits it into background tasks:
//! - a read loop that reassembles frames and forwards them on [`Inbound`];
//! - a write loop that encodes queued [`ClientPacket`]s;
//! - an optional keepalive that queues client heartbeats.
//!
//! The caller gets a cloneable [`Sender`] and the [`Inbound`] frame stream.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use artemis_core::codec::{encode_client, Frame, FrameDecoder, DEFAULT_PORT};
use artemis_core::error::{ArtemisError, ArtemisResult};
use artemis_core::messages::ClientPacket;
use futures_util::Stream;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, trace, warn};

/// Connection settings.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Port used when the host string carries none.
    pub default_port: u16,
    /// Client heartbeat interval in seconds (0 = disabled).
    pub heartbeat_interval_secs: u64,
    /// Connection timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            default_port: DEFAULT_PORT,
            heartbeat_interval_secs: 3,
            timeout_secs: 10,
        }
    }
}

/// Queues outbound packets. Safe to clone and use from any task.
#[derive(Debug, Clone)]
pub struct Sender {
    tx: mpsc::Sender<ClientPacket>,
}

impl Sender {
    pub async fn send(&self, packet: ClientPacket) -> ArtemisResult<()> {
        self.tx
            .send(packet)
            .await
            .map_err(|_| ArtemisError::ConnectionClosed)
    }

    /// Whether the write loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Inbound frames, in arrival order. Ends when the server closes the
/// connection or the stream becomes undecodable.
#[derive(Debug)]
pub struct Inbound {
    rx: mpsc::Receiver<Frame>,
}

impl Stream for Inbound {
    type Item = Frame;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Frame>> {
        self.rx.poll_recv(cx)
    }
}

/// Split `host` into `(host, port)`, applying `default_port` when absent.
///
/// Accepts `name`, `name:port`, `[v6]`, `[v6]:port` and bare IPv6.
pub fn parse_address(host: &str, default_port: u16) -> ArtemisResult<(String, u16)> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ArtemisError::Transport("empty host".into()));
    }

    if let Some(rest) = host.strip_prefix('[') {
        let (addr, tail) = rest
            .split_once(']')
            .ok_or_else(|| ArtemisError::Transport(format!("unterminated '[' in {host}")))?;
        let port = match tail.strip_prefix(':') {
            Some(p) => parse_port(p, host)?,
            None if tail.is_empty() => default_port,
            None => return Err(ArtemisError::Transport(format!("invalid address: {host}"))),
        };
        return Ok((addr.to_string(), port));
    }

    match host.split_once(':') {
        // More than one colon without brackets: a bare IPv6 address.
        Some((_, rest)) if rest.contains(':') => Ok((host.to_string(), default_port)),
        Some((name, port)) => {
            if name.is_empty() {
                return Err(ArtemisError::Transport(format!("empty host in {host}")));
            }
            Ok((name.to_string(), parse_port(port, host)?))
        }
        None => Ok((host.to_string(), default_port)),
    }
}

fn parse_port(port: &str, host: &str) -> ArtemisResult<u16> {
    port.parse()
        .map_err(|_| ArtemisError::Transport(format!("invalid port '{port}' in {host}")))
}

/// Connect to an Artemis server.
pub async fn connect(host: &str, config: &ConnectConfig) -> ArtemisResult<(Sender, Inbound)> {
    let (name, port) = parse_address(host, config.default_port)?;
    let timeout = Duration::from_secs(config.timeout_secs);

    let stream = match time::timeout(timeout, TcpStream::connect((name.as_str(), port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            return Err(ArtemisError::Transport(format!(
                "cannot reach {name}:{port}: {e}"
            )))
        }
        Err(_) => {
            return Err(ArtemisError::Transport(format!(
                "timed out connecting to {name}:{port}"
            )))
        }
    };
    if let Err(e) = stream.set_nodelay(true) {
        debug!("failed to set TCP_NODELAY: {}", e);
    }
    info!(host = %name, port, "connected");

    let (reader, writer) = stream.into_split();
    let (frame_tx, frame_rx) = mpsc::channel::<Frame>(256);
    let (packet_tx, packet_rx) = mpsc::channel::<ClientPacket>(64);

    tokio::spawn(read_loop(reader, frame_tx));
    tokio::spawn(write_loop(writer, packet_rx));

    if config.heartbeat_interval_secs > 0 {
        let interval = Duration::from_secs(config.heartbeat_interval_secs);
        tokio::spawn(keepalive_loop(packet_tx.downgrade(), interval));
    }

    Ok((Sender { tx: packet_tx }, Inbound { rx: frame_rx }))
}

async fn read_loop(mut reader: OwnedReadHalf, frames: mpsc::Sender<Frame>) {
    let mut decoder = FrameDecoder::new();
    let mut buf = vec![0u8; 8192];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                info!("server closed the connection");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                error!("socket read error: {}", e);
                break;
            }
        };

        let batch = match decoder.feed(&buf[..n]) {
            Ok(batch) => batch,
            Err(e) => {
                error!("dropping connection: {}", e);
                break;
            }
        };

        for frame in batch {
            trace!(
                packet_type = format_args!("0x{:08x}", frame.packet_type),
                len = frame.payload.len(),
                "frame received"
            );
            if frames.send(frame).await.is_err() {
                debug!("inbound receiver dropped");
                return;
            }
        }
    }

    debug!("read loop ended");
}

async fn write_loop(mut writer: OwnedWriteHalf, mut outgoing: mpsc::Receiver<ClientPacket>) {
    while let Some(packet) = outgoing.recv().await {
        let bytes = encode_client(packet);
        if let Err(e) = writer.write_all(&bytes).await {
            error!("failed to send {:?}: {}", packet, e);
            break;
        }
        trace!(?packet, "packet sent");
    }

    if let Err(e) = writer.shutdown().await {
        debug!("socket shutdown: {}", e);
    }
    debug!("write loop ended");
}

/// Queue a heartbeat every `interval` until every [`Sender`] is gone or the
/// write loop stops.
async fn keepalive_loop(outgoing: mpsc::WeakSender<ClientPacket>, interval: Duration) {
    let mut ticker = time::interval(interval);
    ticker.tick().await; // skip first immediate tick

    loop {
        ticker.tick().await;

        let Some(tx) = outgoing.upgrade() else {
            break;
        };
        if tx.send(ClientPacket::Heartbeat).await.is_err() {
            warn!("keepalive stopped: connection closed");
            break;
        }
    }

    debug!("keepalive loop ended");
}
