//! # Connection Handler
//!
//! One task pair per accepted socket:
//!
//! ```text
//!  socket ──read──► FramedRead ──► dispatch ──┐
//!                                             ├──► mpsc (bounded) ──► writer task ──► FramedWrite ──► socket
//!  routing table (other connections) ─────────┘
//! ```
//!
//! Messages from one connection are dispatched strictly one after another.
//! Whatever ends the read loop (peer close, `UNREGISTER`, decode or socket
//! error, or the writer giving up on a reply it cannot write) the
//! identities bound through the connection are unregistered.

use dl_01_message_codec::MessageCodec;
use dl_04_domain_registry::ConnectionHandle;
use futures::{SinkExt, StreamExt};
use shared_types::Message;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, info, warn};

use crate::service::{ConnectionContext, CoreService, Flow};

/// Capacity of each connection's outbound queue.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Serve one client until it disconnects.
pub async fn handle_connection(service: Arc<CoreService>, stream: TcpStream, peer: SocketAddr) {
    service.stats().update_stats_increment("client", "total_num", 1);
    if let Err(e) = stream.set_nodelay(true) {
        debug!(%peer, error = %e, "set_nodelay failed");
    }

    let (read_half, write_half) = stream.into_split();
    serve(&service, read_half, write_half, peer, MessageCodec::new()).await;
    service.stats().update_stats_decrement("client", "total_num", 1);
    debug!(%peer, "Connection finished");
}

/// Run the read loop and the writer task over one byte stream.
async fn serve<R, W>(service: &CoreService, reader: R, writer: W, peer: SocketAddr, codec: MessageCodec)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let (stop_tx, stop_rx) = oneshot::channel();
    let mut writer = tokio::spawn(write_loop(FramedWrite::new(writer, codec), rx, stop_rx, peer));
    let mut writer_done = false;

    let mut conn = ConnectionContext::new(ConnectionHandle::new(tx), peer);
    let mut frames = FramedRead::new(reader, codec);
    loop {
        tokio::select! {
            frame = frames.next() => match frame {
                Some(Ok(message)) => {
                    if service.dispatch(message, &mut conn).await == Flow::Close {
                        debug!(%peer, "Connection closed by UNREGISTER");
                        break;
                    }
                }
                Some(Err(e)) => {
                    info!(%peer, error = %e, "TCP disconnect");
                    break;
                }
                None => break,
            },
            joined = &mut writer => {
                writer_done = true;
                if let Err(e) = joined {
                    warn!(%peer, error = %e, "Writer task failed");
                }
                info!(%peer, "Writer stopped, closing connection");
                break;
            }
        }
    }

    service.release_connection(&mut conn);
    drop(conn);

    if !writer_done {
        let _ = stop_tx.send(());
        if let Err(e) = writer.await {
            warn!(%peer, error = %e, "Writer task failed");
        }
    }
}

/// Drain the outbound queue into the socket until the reader side stops,
/// then flush whatever is still queued.
async fn write_loop<W>(
    mut sink: FramedWrite<W, MessageCodec>,
    mut rx: mpsc::Receiver<Message>,
    mut stop: oneshot::Receiver<()>,
    peer: SocketAddr,
) where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            message = rx.recv() => {
                let Some(message) = message else { break };
                if let Err(e) = sink.send(message).await {
                    warn!(%peer, error = %e, "Write failed");
                    return;
                }
            }
            _ = &mut stop => {
                rx.close();
                while let Ok(message) = rx.try_recv() {
                    if sink.feed(message).await.is_err() {
                        return;
                    }
                }
                break;
            }
        }
    }
    if let Err(e) = sink.flush().await {
        debug!(%peer, error = %e, "Final flush failed");
    }
}
