//! Websocket transport. Speaks the same JSON event protocol as the peer
//! connection transport, minus the media track, and doubles as the
//! transport of choice for driving the protocol against plain websocket
//! endpoints.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use secrecy::ExposeSecret;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::config::{
    ConnectOptions, EphemeralCredential, AUTHORIZATION_HEADER, DEFAULT_WS_URL, OPENAI_BETA_HEADER,
    OPENAI_BETA_VALUE,
};
use crate::connector::{Connector, DisconnectHook, EventStream, Lifecycle};
use crate::error::ConnectorError;
use crate::types::{ClientEvent, ServerEvent};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

fn build_request(
    credential: &EphemeralCredential,
    options: &ConnectOptions,
) -> tokio_tungstenite::tungstenite::Result<Request> {
    let base = options.base_url().unwrap_or(DEFAULT_WS_URL);
    let mut request = format!("{}?model={}", base, credential.model()).into_client_request()?;
    request.headers_mut().insert(
        AUTHORIZATION_HEADER,
        format!("Bearer {}", credential.token().expose_secret())
            .as_str()
            .parse()?,
    );
    request
        .headers_mut()
        .insert(OPENAI_BETA_HEADER, OPENAI_BETA_VALUE.parse()?);
    Ok(request)
}

pub struct WsConnector {
    writer: tokio::sync::Mutex<Option<WsSink>>,
    events: Mutex<Option<EventStream>>,
    lifecycle: Arc<Lifecycle>,
    reader: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl WsConnector {
    pub async fn connect(
        credential: &EphemeralCredential,
        options: &ConnectOptions,
    ) -> Result<Self, ConnectorError> {
        let request = build_request(credential, options)?;
        let (stream, _) = tokio_tungstenite::connect_async(request).await?;
        tracing::debug!("websocket transport connected");
        Ok(Self::from_stream(stream, options.capacity()))
    }

    fn from_stream(stream: WebSocketStream<MaybeTlsStream<TcpStream>>, capacity: usize) -> Self {
        let (write, read) = stream.split();
        let (events_tx, events_rx) = mpsc::channel(capacity);
        let lifecycle = Arc::new(Lifecycle::new());
        let reader = tokio::spawn(read_loop(read, events_tx, Arc::clone(&lifecycle)));
        Self {
            writer: tokio::sync::Mutex::new(Some(write)),
            events: Mutex::new(Some(events_rx)),
            lifecycle,
            reader: Mutex::new(Some(reader)),
        }
    }
}

async fn read_loop(
    mut read: WsSource,
    events: mpsc::Sender<Result<ServerEvent, ConnectorError>>,
    lifecycle: Arc<Lifecycle>,
) {
    while let Some(message) = read.next().await {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("failed to read message: {}", e);
                break;
            }
        };
        match message {
            Message::Text(text) => match serde_json::from_str::<ServerEvent>(&text) {
                Ok(event) => {
                    if events.send(Ok(event)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("failed to deserialize event: {}, text=> {:?}", e, text);
                    if events.send(Err(ConnectorError::Json(e))).await.is_err() {
                        break;
                    }
                }
            },
            Message::Binary(bin) => {
                tracing::warn!("unexpected binary message: {} bytes", bin.len());
            }
            Message::Close(reason) => {
                tracing::info!("connection closed: {:?}", reason);
                break;
            }
            _ => {}
        }
    }
    lifecycle.fire_disconnect();
}

#[async_trait]
impl Connector for WsConnector {
    async fn send(&self, event: ClientEvent) -> Result<(), ConnectorError> {
        if self.lifecycle.is_closed() {
            return Err(ConnectorError::ChannelNotOpen);
        }
        let text = serde_json::to_string(&event)?;
        let mut writer = self.writer.lock().await;
        let Some(sink) = writer.as_mut() else {
            return Err(ConnectorError::ChannelNotOpen);
        };
        sink.send(Message::Text(text)).await?;
        Ok(())
    }

    fn take_events(&self) -> Option<EventStream> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    fn on_disconnect(&self, hook: DisconnectHook) {
        self.lifecycle.set_hook(hook);
    }

    async fn close(&self) {
        if !self.lifecycle.shutdown() {
            return;
        }
        {
            let mut writer = self.writer.lock().await;
            if let Some(mut sink) = writer.take() {
                if let Err(e) = sink.close().await {
                    tracing::debug!("websocket close: {}", e);
                }
            }
        }
        let reader = self
            .reader
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(reader) = reader {
            reader.abort();
        }
        self.lifecycle.fire_disconnect();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::types::events::client::{ResponseCreateEvent, SessionUpdateEvent};
    use crate::types::Session;
    use tokio::net::TcpListener;

    fn init_logs() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    async fn connect_local(addr: std::net::SocketAddr) -> WsConnector {
        let credential = EphemeralCredential::new("ek_test");
        let options = ConnectOptions::new().with_base_url(format!("ws://{}/", addr));
        WsConnector::connect(&credential, &options)
            .await
            .expect("connect")
    }

    #[tokio::test]
    async fn delivers_replies_then_ends_stream_on_remote_close() {
        init_logs();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");
            // Expect one client event, then reply and close.
            let inbound = ws.next().await.expect("inbound").expect("frame");
            let value: serde_json::Value =
                serde_json::from_str(inbound.to_text().expect("text")).expect("json");
            assert_eq!(value["type"], "session.update");
            let reply = serde_json::json!({
                "type": "session.created",
                "event_id": "event_1",
                "session": {"id": "sess_1"}
            });
            ws.send(Message::Text(reply.to_string())).await.expect("reply");
            ws.close(None).await.expect("close");
        });

        let connector = connect_local(addr).await;
        let mut events = connector.take_events().expect("event stream");
        assert!(connector.take_events().is_none());

        connector
            .send(ClientEvent::SessionUpdate(SessionUpdateEvent::new(
                Session::new(),
            )))
            .await
            .expect("send");

        let event = events.recv().await.expect("reply").expect("decoded");
        assert!(matches!(event, ServerEvent::SessionCreated(_)));
        assert!(events.recv().await.is_none());

        server.await.expect("server");
    }

    #[tokio::test]
    async fn remote_close_fires_disconnect_hook_exactly_once() {
        init_logs();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");
            ws.close(None).await.expect("close");
        });

        let connector = connect_local(addr).await;
        let (fired_tx, mut fired_rx) = mpsc::unbounded_channel();
        connector.on_disconnect(Box::new(move || {
            let _ = fired_tx.send(());
        }));

        let mut events = connector.take_events().expect("event stream");
        assert!(events.recv().await.is_none());
        fired_rx.recv().await.expect("hook fired");

        // A local close after the remote one must not fire the hook again.
        connector.close().await;
        assert!(fired_rx.try_recv().is_err());

        server.await.expect("server");
    }

    #[tokio::test]
    async fn send_after_close_fails_without_buffering() {
        init_logs();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.expect("accept");
            let mut ws = tokio_tungstenite::accept_async(stream).await.expect("upgrade");
            while let Some(Ok(message)) = ws.next().await {
                if message.is_close() {
                    break;
                }
            }
        });

        let connector = connect_local(addr).await;
        connector.close().await;
        connector.close().await;

        let result = connector
            .send(ClientEvent::ResponseCreate(ResponseCreateEvent::new()))
            .await;
        assert!(matches!(result, Err(ConnectorError::ChannelNotOpen)));

        server.await.expect("server");
    }
}
