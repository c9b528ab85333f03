// WebSocket server for the helper and remote devices.
//
// Each connection runs in its own task. Every text frame is one request; it
// is handed to the app task through a single mpsc channel together with a
// oneshot for the reply, and the reply is written back on the same socket.
// The app task handles one request at a time, which serializes every
// mutation no matter how many clients are connected.

use async_trait::async_trait;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

/// Events emitted by the WebSocket server to the application layer.
#[derive(Debug)]
pub enum WsEvent {
    /// A client finished the WebSocket handshake.
    Connected { addr: String },
    /// A client went away.
    Disconnected { addr: String },
    /// A text frame (raw JSON request). The app must answer on `reply`.
    Request {
        addr: String,
        payload: String,
        reply: oneshot::Sender<String>,
    },
}

/// Turns a request payload into a reply payload.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// `None` means the handler is gone and the connection should close.
    async fn handle(&self, addr: &str, payload: String) -> Option<String>;
}

/// The production handler: forward to the app task and wait for its answer.
#[async_trait]
impl RequestHandler for mpsc::Sender<WsEvent> {
    async fn handle(&self, addr: &str, payload: String) -> Option<String> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(WsEvent::Request {
            addr: addr.to_string(),
            payload,
            reply: reply_tx,
        })
        .await
        .ok()?;
        reply_rx.await.ok()
    }
}

/// Bind `host:port` and serve until the app side of `tx` is dropped.
pub async fn run(host: &str, port: u16, tx: mpsc::Sender<WsEvent>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(format!("{host}:{port}")).await?;
    serve(listener, tx).await
}

/// Accept connections on an already-bound listener, one task per client.
pub async fn serve(listener: TcpListener, tx: mpsc::Sender<WsEvent>) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    info!("WebSocket server listening on {local_addr}");

    loop {
        let (stream, addr) = listener.accept().await?;
        if tx.is_closed() {
            info!("App channel closed, WebSocket server stopping");
            break;
        }
        let addr_str = addr.to_string();
        info!("Accepted TCP connection from {addr_str}");
        tokio::spawn(handle_connection(stream, addr_str, tx.clone()));
    }

    Ok(())
}

async fn handle_connection(stream: TcpStream, addr: String, tx: mpsc::Sender<WsEvent>) {
    let ws_stream = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake failed for {addr}: {e}");
            return;
        }
    };

    if tx
        .send(WsEvent::Connected { addr: addr.clone() })
        .await
        .is_err()
    {
        return;
    }

    let (mut write, read) = ws_stream.split();
    if process_message_stream(read, &mut write, &tx, &addr)
        .await
        .is_err()
    {
        debug!("App channel closed while serving {addr}");
    }

    let _ = tx.send(WsEvent::Disconnected { addr }).await;
}

/// Answer every text message from `stream` through `handler`, writing each
/// reply to `sink`. Returns `Err(())` if the handler is gone, signalling the
/// caller to stop.
///
/// Generic over the stream and sink so it can be tested with in-memory
/// values instead of sockets.
pub async fn process_message_stream<St, Si, H>(
    mut stream: St,
    sink: &mut Si,
    handler: &H,
    addr: &str,
) -> Result<(), ()>
where
    St: Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    Si: Sink<Message> + Unpin,
    Si::Error: std::fmt::Display,
    H: RequestHandler + ?Sized,
{
    while let Some(msg_result) = stream.next().await {
        match msg_result {
            Ok(Message::Text(text)) => {
                let Some(reply) = handler.handle(addr, text.to_string()).await else {
                    return Err(());
                };
                if let Err(e) = sink.send(Message::Text(reply.into())).await {
                    warn!("Failed to send reply to {addr}: {e}");
                    break;
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {addr} sent close frame");
                break;
            }
            Err(e) => {
                warn!("WebSocket error from {addr}: {e}");
                break;
            }
            _ => {
                // Ignore Binary, Ping, Pong, Frame variants.
            }
        }
    }
    Ok(())
}
