use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::messages::{encode_client_message, OutboundFrame};
use super::{
    Connector, Link, TransportEvent, TransportEventKind, ABNORMAL_CLOSURE, NORMAL_CLOSURE,
    NO_STATUS_RECEIVED,
};
use crate::error::ClientError;
use crate::event::{ClientEvent, EventSender};

enum Outgoing {
    Frame(Message),
    Close,
}

/// Opens WebSocket connections with tokio-tungstenite, one task per connection
#[derive(Debug, Default, Clone, Copy)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for WebSocketConnector {
    fn open(&self, url: &str, generation: u64, events: EventSender) -> Box<dyn Link> {
        let (outgoing_tx, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(run_connection(
            url.to_string(),
            generation,
            outgoing_rx,
            events,
        ));
        Box::new(WebSocketLink {
            outgoing: outgoing_tx,
        })
    }
}

struct WebSocketLink {
    outgoing: mpsc::UnboundedSender<Outgoing>,
}

impl Link for WebSocketLink {
    fn send(&self, frame: OutboundFrame) -> Result<(), ClientError> {
        let message = match frame {
            OutboundFrame::Audio(bytes) => Message::Binary(bytes.into()),
            OutboundFrame::Control(control) => Message::Text(encode_client_message(&control)?.into()),
        };

        self.outgoing
            .send(Outgoing::Frame(message))
            .map_err(|_| ClientError::Transport("connection task has exited".to_string()))
    }

    fn close(&self) {
        let _ = self.outgoing.send(Outgoing::Close);
    }
}

async fn run_connection(
    url: String,
    generation: u64,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    events: EventSender,
) {
    let emit = |kind: TransportEventKind| {
        let _ = events.send(ClientEvent::Transport(TransportEvent::new(generation, kind)));
    };
    let closed = |code: u16, reason: &str| TransportEventKind::Closed {
        code,
        reason: reason.to_string(),
    };

    info!("Connecting to {} (generation {})", url, generation);

    let socket = match connect_async(url.as_str()).await {
        Ok((socket, _)) => socket,
        Err(e) => {
            emit(TransportEventKind::Error(e.to_string()));
            emit(closed(ABNORMAL_CLOSURE, "connect failed"));
            return;
        }
    };

    info!("WebSocket connected: {}", url);
    emit(TransportEventKind::Opened);

    let (mut sink, mut stream) = socket.split();
    let mut closing = false;

    loop {
        tokio::select! {
            out = outgoing.recv(), if !closing => match out {
                Some(Outgoing::Frame(message)) => {
                    if let Err(e) = sink.send(message).await {
                        emit(TransportEventKind::Error(e.to_string()));
                        emit(closed(ABNORMAL_CLOSURE, "send failed"));
                        return;
                    }
                }
                // Explicit close, or the link was dropped
                Some(Outgoing::Close) | None => {
                    closing = true;
                    let frame = CloseFrame {
                        code: CloseCode::Normal,
                        reason: "client shutdown".into(),
                    };
                    if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                        debug!("Close handshake failed: {}", e);
                        emit(closed(NORMAL_CLOSURE, "client shutdown"));
                        return;
                    }
                }
            },
            inbound = stream.next() => match inbound {
                Some(Ok(Message::Binary(data))) => emit(TransportEventKind::Binary(data.to_vec())),
                Some(Ok(Message::Text(text))) => emit(TransportEventKind::Text(text.to_string())),
                Some(Ok(Message::Close(frame))) => {
                    let (code, reason) = frame
                        .map(|f| (u16::from(f.code), f.reason.to_string()))
                        .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                    info!("WebSocket closed by peer: code={} reason={:?}", code, reason);
                    emit(TransportEventKind::Closed { code, reason });
                    return;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!("WebSocket read failed: {}", e);
                    emit(TransportEventKind::Error(e.to_string()));
                    emit(closed(ABNORMAL_CLOSURE, "read failed"));
                    return;
                }
                None => {
                    let code = if closing { NORMAL_CLOSURE } else { ABNORMAL_CLOSURE };
                    emit(closed(code, "stream ended"));
                    return;
                }
            }
        }
    }
}
