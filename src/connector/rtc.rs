//! Peer connection transport: SDP offer/answer over one authenticated
//! HTTP round trip, a reliable ordered data channel for JSON events, and
//! an outbound microphone track.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use secrecy::ExposeSecret;
use tokio::sync::mpsc;
use webrtc::api::media_engine::{MediaEngine, MIME_TYPE_PCMU};
use webrtc::api::APIBuilder;
use webrtc::data_channel::data_channel_init::RTCDataChannelInit;
use webrtc::data_channel::data_channel_message::DataChannelMessage;
use webrtc::data_channel::data_channel_state::RTCDataChannelState;
use webrtc::data_channel::RTCDataChannel;
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::media::Sample;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;
use webrtc::track::track_local::TrackLocal;

use crate::config::{
    ConnectOptions, EphemeralCredential, AUTHORIZATION_HEADER, DEFAULT_BASE_URL,
    OPENAI_BETA_HEADER, OPENAI_BETA_VALUE,
};
use crate::connector::{Connector, DisconnectHook, EventStream, Lifecycle};
use crate::error::ConnectorError;
use crate::types::{ClientEvent, ServerEvent};
use reflect_realtime_audio::codec;
use reflect_realtime_audio::resample::decimate;
use reflect_realtime_audio::WIRE_SAMPLE_RATE;

const STUN_SERVER: &str = "stun:stun.l.google.com:19302";
const DATA_CHANNEL_LABEL: &str = "oai-events";

/// The media track runs at telephony rate with G.711 mu-law payloads.
const TELEPHONY_SAMPLE_RATE: f64 = 8000.0;

enum Inbound {
    Event(Result<ServerEvent, ConnectorError>),
    Halt,
}

pub struct RtcConnector {
    pc: Arc<RTCPeerConnection>,
    channel: Arc<RTCDataChannel>,
    track: Arc<TrackLocalStaticSample>,
    events: Mutex<Option<EventStream>>,
    lifecycle: Arc<Lifecycle>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
}

impl RtcConnector {
    /// Establishes the peer connection: gathers a complete offer locally,
    /// exchanges it for an answer over one authenticated request, then
    /// waits for the data channel to open.
    pub async fn connect(
        credential: &EphemeralCredential,
        options: &ConnectOptions,
    ) -> Result<Self, ConnectorError> {
        let mut media = MediaEngine::default();
        media.register_default_codecs()?;
        let api = APIBuilder::new().with_media_engine(media).build();

        let config = RTCConfiguration {
            ice_servers: vec![RTCIceServer {
                urls: vec![STUN_SERVER.to_owned()],
                ..Default::default()
            }],
            ..Default::default()
        };
        let pc = Arc::new(api.new_peer_connection(config).await?);

        let channel = pc
            .create_data_channel(
                DATA_CHANNEL_LABEL,
                Some(RTCDataChannelInit {
                    ordered: Some(true),
                    ..Default::default()
                }),
            )
            .await?;

        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_PCMU.to_owned(),
                clock_rate: TELEPHONY_SAMPLE_RATE as u32,
                channels: 1,
                ..Default::default()
            },
            "audio0".to_owned(),
            "audioStream".to_owned(),
        ));
        pc.add_track(Arc::clone(&track) as Arc<dyn TrackLocal + Send + Sync>)
            .await?;

        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::channel(options.capacity());
        let (ready_tx, mut ready_rx) = mpsc::channel::<Result<(), ConnectorError>>(1);

        let message_tx = inbound_tx.clone();
        channel.on_message(Box::new(move |message: DataChannelMessage| {
            let message_tx = message_tx.clone();
            Box::pin(async move {
                if message.is_string {
                    match serde_json::from_slice::<ServerEvent>(&message.data) {
                        Ok(event) => {
                            let _ = message_tx.send(Inbound::Event(Ok(event)));
                        }
                        Err(e) => {
                            tracing::error!("failed to deserialize event: {}", e);
                            let _ = message_tx.send(Inbound::Event(Err(ConnectorError::Json(e))));
                        }
                    }
                } else {
                    tracing::warn!("unexpected binary message: {} bytes", message.data.len());
                }
            })
        }));

        let open_tx = ready_tx.clone();
        channel.on_open(Box::new(move || {
            let open_tx = open_tx.clone();
            Box::pin(async move {
                let _ = open_tx.try_send(Ok(()));
            })
        }));

        let close_tx = inbound_tx.clone();
        channel.on_close(Box::new(move || {
            let close_tx = close_tx.clone();
            Box::pin(async move {
                tracing::info!("data channel closed");
                let _ = close_tx.send(Inbound::Halt);
            })
        }));

        let state_inbound = inbound_tx.clone();
        pc.on_peer_connection_state_change(Box::new(move |state: RTCPeerConnectionState| {
            tracing::debug!("peer connection state: {}", state);
            let state_inbound = state_inbound.clone();
            let state_ready = ready_tx.clone();
            Box::pin(async move {
                match state {
                    RTCPeerConnectionState::Failed
                    | RTCPeerConnectionState::Disconnected
                    | RTCPeerConnectionState::Closed => {
                        let _ = state_ready.try_send(Err(ConnectorError::Handshake(format!(
                            "peer connection {}",
                            state
                        ))));
                        let _ = state_inbound.send(Inbound::Halt);
                    }
                    _ => {}
                }
            })
        }));

        // Wait out ICE gathering so the offer carries its candidates; the
        // remote end answers in a single round trip with no trickle.
        let offer = pc.create_offer(None).await?;
        let mut gather_complete = pc.gathering_complete_promise().await;
        pc.set_local_description(offer).await?;
        let _ = gather_complete.recv().await;
        let local = pc
            .local_description()
            .await
            .ok_or_else(|| ConnectorError::Handshake("missing local description".into()))?;

        let answer_sdp = exchange_sdp(credential, options, &local.sdp).await?;
        let answer = RTCSessionDescription::answer(answer_sdp)?;
        pc.set_remote_description(answer).await?;

        match ready_rx.recv().await {
            Some(Ok(())) => {}
            Some(Err(e)) => {
                let _ = pc.close().await;
                return Err(e);
            }
            None => {
                let _ = pc.close().await;
                return Err(ConnectorError::Closed);
            }
        }
        tracing::debug!("data channel open");

        let lifecycle = Arc::new(Lifecycle::new());
        tokio::spawn(pump_events(
            inbound_rx,
            events_tx,
            Arc::clone(&pc),
            Arc::clone(&lifecycle),
        ));

        Ok(Self {
            pc,
            channel,
            track,
            events: Mutex::new(Some(events_rx)),
            lifecycle,
            inbound_tx,
        })
    }
}

/// Forwards decoded events to the consumer in arrival order and performs
/// the remote-close teardown when the channel or connection dies.
async fn pump_events(
    mut inbound: mpsc::UnboundedReceiver<Inbound>,
    events: mpsc::Sender<Result<ServerEvent, ConnectorError>>,
    pc: Arc<RTCPeerConnection>,
    lifecycle: Arc<Lifecycle>,
) {
    while let Some(item) = inbound.recv().await {
        match item {
            Inbound::Event(event) => {
                if events.send(event).await.is_err() {
                    break;
                }
            }
            Inbound::Halt => break,
        }
    }
    if lifecycle.shutdown() {
        if let Err(e) = pc.close().await {
            tracing::debug!("peer connection close: {}", e);
        }
    }
    lifecycle.fire_disconnect();
}

async fn exchange_sdp(
    credential: &EphemeralCredential,
    options: &ConnectOptions,
    offer: &str,
) -> Result<String, ConnectorError> {
    let base = options.base_url().unwrap_or(DEFAULT_BASE_URL);
    let url = format!("{}?model={}", base, credential.model());
    let response = reqwest::Client::new()
        .post(&url)
        .header(
            AUTHORIZATION_HEADER,
            format!("Bearer {}", credential.token().expose_secret()),
        )
        .header(OPENAI_BETA_HEADER, OPENAI_BETA_VALUE)
        .header(reqwest::header::CONTENT_TYPE, "application/sdp")
        .body(offer.to_owned())
        .send()
        .await?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        return Err(ConnectorError::SdpExchange {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

#[async_trait]
impl Connector for RtcConnector {
    async fn send(&self, event: ClientEvent) -> Result<(), ConnectorError> {
        if self.channel.ready_state() != RTCDataChannelState::Open {
            return Err(ConnectorError::ChannelNotOpen);
        }
        let text = serde_json::to_string(&event)?;
        self.channel.send_text(text).await?;
        Ok(())
    }

    async fn send_media(&self, pcm: &[u8]) -> Result<(), ConnectorError> {
        if self.lifecycle.is_closed() {
            return Err(ConnectorError::ChannelNotOpen);
        }
        let samples = codec::pcm16_to_f32(pcm);
        let factor = (WIRE_SAMPLE_RATE / TELEPHONY_SAMPLE_RATE) as usize;
        let telephony = decimate(&samples, factor);
        if telephony.is_empty() {
            return Ok(());
        }
        let duration =
            Duration::from_micros(telephony.len() as u64 * 1_000_000 / TELEPHONY_SAMPLE_RATE as u64);
        self.track
            .write_sample(&Sample {
                data: Bytes::from(codec::f32_to_mulaw(&telephony)),
                duration,
                ..Default::default()
            })
            .await?;
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
        if let Err(e) = self.channel.close().await {
            tracing::debug!("data channel close: {}", e);
        }
        if let Err(e) = self.pc.close().await {
            tracing::debug!("peer connection close: {}", e);
        }
        let _ = self.inbound_tx.send(Inbound::Halt);
        self.lifecycle.fire_disconnect();
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn init_logs() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    }

    async fn serve_sdp(listener: TcpListener, status_line: &'static str, body: &'static str) {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let (headers_end, content_length) = loop {
            let n = stream.read(&mut chunk).await.expect("read");
            assert!(n > 0, "client hung up mid-request");
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
                let content_length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|v| v.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                break (pos + 4, content_length);
            }
        };
        while buf.len() < headers_end + content_length {
            let n = stream.read(&mut chunk).await.expect("read body");
            assert!(n > 0, "client hung up mid-body");
            buf.extend_from_slice(&chunk[..n]);
        }
        let request = String::from_utf8_lossy(&buf[..headers_end]);
        assert!(request.contains("POST /realtime?model="));
        assert!(request.to_lowercase().contains("content-type: application/sdp"));
        assert!(request.contains("Bearer ek_test"));

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: application/sdp\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await.expect("write");
        stream.shutdown().await.expect("shutdown");
    }

    #[tokio::test]
    async fn sdp_exchange_returns_answer_body() {
        init_logs();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(serve_sdp(listener, "200 OK", "v=0\r\ns=answer\r\n"));

        let credential = EphemeralCredential::new("ek_test");
        let options = ConnectOptions::new().with_base_url(format!("http://{}/realtime", addr));
        let answer = exchange_sdp(&credential, &options, "v=0\r\ns=offer\r\n")
            .await
            .expect("answer");
        assert_eq!(answer, "v=0\r\ns=answer\r\n");

        server.await.expect("server");
    }

    #[tokio::test]
    async fn sdp_exchange_surfaces_rejection_status_and_body() {
        init_logs();
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(serve_sdp(listener, "401 Unauthorized", "invalid token"));

        let credential = EphemeralCredential::new("ek_test");
        let options = ConnectOptions::new().with_base_url(format!("http://{}/realtime", addr));
        let err = exchange_sdp(&credential, &options, "v=0\r\n")
            .await
            .expect_err("rejected");
        match err {
            ConnectorError::SdpExchange { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid token");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        server.await.expect("server");
    }
}
