//! The conversation session state machine.
//!
//! One [`Conversation`] owns a transport connector and the ordered
//! transcript it rebuilds from streamed events. A single background task
//! consumes the connector's event sequence in arrival order and is the only
//! mutator of the transcript; commands go straight out through the
//! connector, preserving caller order on the reliable channel. Session
//! flags publish through a watch channel so the UI can observe without
//! polling. When voice is active, audio crosses the [`AudioBridge`] seam in
//! both directions.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use bytes::Bytes;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use uuid::Uuid;

use reflect_realtime_audio::codec::{decode_base64, encode_base64};
use reflect_realtime_audio::{AudioBridge, BridgeNotice};

use crate::config::{ConnectOptions, EphemeralCredential};
use crate::connector::{Connector, EventStream, RtcConnector};
use crate::error::ConversationError;
use crate::types::events::client::{
    ConversationItemCreateEvent, ConversationItemTruncateEvent, InputAudioBufferAppendEvent,
    InputAudioBufferCommitEvent, ResponseCreateEvent, SessionUpdateEvent,
};
use crate::types::{
    ClientEvent, ContentPart, FunctionCallItem, FunctionCallOutputItem, Item, MessageItem,
    MessageRole, ResponseConfig, ServerEvent, Session,
};

/// Point-in-time view of the session flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Snapshot {
    /// A `session.created` has arrived and the transport is still up.
    pub connected: bool,
    /// The microphone tap is feeding the input audio buffer.
    pub is_listening: bool,
    /// Speaker and microphone are engaged.
    pub handling_voice: bool,
    /// Server turn detection currently hears the user.
    pub is_user_speaking: bool,
    /// Decoded response audio remains queued for the output device.
    pub is_playing: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReadyState {
    Pending,
    Ready,
    Closed,
}

#[derive(Default)]
struct VoiceTasks {
    notices: Option<JoinHandle<()>>,
    capture: Option<JoinHandle<()>>,
}

struct Inner {
    connector: Arc<dyn Connector>,
    bridge: Option<Arc<dyn AudioBridge>>,
    entries: Mutex<Vec<Item>>,
    session: Mutex<Option<Session>>,
    conversation_id: Mutex<Option<String>>,
    snapshot: watch::Sender<Snapshot>,
    ready: watch::Sender<ReadyState>,
    errors_tx: mpsc::UnboundedSender<ConversationError>,
    errors_rx: Mutex<Option<mpsc::UnboundedReceiver<ConversationError>>>,
    on_disconnect: Mutex<Option<Box<dyn FnOnce() + Send>>>,
    ended: AtomicBool,
    voice: Mutex<VoiceTasks>,
}

/// A live realtime session.
///
/// Construction opens the transport; the instance then rebuilds the
/// conversation transcript from streamed events until it is stopped or the
/// transport drops. Instances are not reused: a new session attempt always
/// builds a fresh `Conversation` with an empty transcript.
pub struct Conversation {
    inner: Arc<Inner>,
    events_task: JoinHandle<()>,
}

impl Conversation {
    /// Connects over the peer connection transport and waits for the
    /// server to confirm the session. Callers bound this with their own
    /// timeout; dropping the future cancels the attempt.
    pub async fn connect(
        credential: &EphemeralCredential,
        options: &ConnectOptions,
    ) -> Result<Self, ConversationError> {
        let connector = RtcConnector::connect(credential, options).await?;
        let conversation = Self::with_connector(Arc::new(connector), None)?;
        conversation.wait_until_ready().await?;
        Ok(conversation)
    }

    /// Same as [`connect`](Self::connect) with an audio backend attached
    /// for voice handling.
    pub async fn connect_with_audio(
        credential: &EphemeralCredential,
        options: &ConnectOptions,
        bridge: Arc<dyn AudioBridge>,
    ) -> Result<Self, ConversationError> {
        let connector = RtcConnector::connect(credential, options).await?;
        let conversation = Self::with_connector(Arc::new(connector), Some(bridge))?;
        conversation.wait_until_ready().await?;
        Ok(conversation)
    }

    /// Builds a session on an already-established connector. Fails when
    /// the connector's event sequence was taken before.
    pub fn with_connector(
        connector: Arc<dyn Connector>,
        bridge: Option<Arc<dyn AudioBridge>>,
    ) -> Result<Self, ConversationError> {
        let events = connector
            .take_events()
            .ok_or(ConversationError::Disconnected)?;
        let (snapshot, _) = watch::channel(Snapshot::default());
        let (ready, _) = watch::channel(ReadyState::Pending);
        let (errors_tx, errors_rx) = mpsc::unbounded_channel();
        let inner = Arc::new(Inner {
            connector,
            bridge,
            entries: Mutex::new(Vec::new()),
            session: Mutex::new(None),
            conversation_id: Mutex::new(None),
            snapshot,
            ready,
            errors_tx,
            errors_rx: Mutex::new(Some(errors_rx)),
            on_disconnect: Mutex::new(None),
            ended: AtomicBool::new(false),
            voice: Mutex::new(VoiceTasks::default()),
        });
        let events_task = tokio::spawn(run_events(Arc::clone(&inner), events));
        Ok(Self { inner, events_task })
    }

    /// Resolves once the server has confirmed the session with
    /// `session.created`, or fails when the transport ends first.
    pub async fn wait_until_ready(&self) -> Result<(), ConversationError> {
        let mut ready = self.inner.ready.subscribe();
        let state = ready
            .wait_for(|state| *state != ReadyState::Pending)
            .await
            .map_err(|_| ConversationError::Disconnected)?;
        match *state {
            ReadyState::Ready => Ok(()),
            ReadyState::Pending | ReadyState::Closed => Err(ConversationError::Disconnected),
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.snapshot.borrow().clone()
    }

    /// Watch handle over the session flags; wakes on every change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.snapshot.subscribe()
    }

    /// The server-confirmed session configuration, once one exists.
    pub fn session(&self) -> Option<Session> {
        lock(&self.inner.session).clone()
    }

    pub fn conversation_id(&self) -> Option<String> {
        lock(&self.inner.conversation_id).clone()
    }

    /// Current transcript in insertion order. Remains harvestable after
    /// the transport has ended.
    pub fn entries(&self) -> Vec<Item> {
        lock(&self.inner.entries).clone()
    }

    /// The message entries of the transcript, for the end-of-session
    /// hand-off.
    pub fn messages(&self) -> Vec<MessageItem> {
        lock(&self.inner.entries)
            .iter()
            .filter_map(|item| item.as_message().cloned())
            .collect()
    }

    /// Takes the side stream of non-fatal session errors. Yields `None`
    /// after the first call.
    pub fn errors(&self) -> Option<mpsc::UnboundedReceiver<ConversationError>> {
        lock(&self.inner.errors_rx).take()
    }

    /// Registers the hook run once when the transport goes away,
    /// replacing any previous one.
    pub fn on_disconnect(&self, hook: impl FnOnce() + Send + 'static) {
        *lock(&self.inner.on_disconnect) = Some(Box::new(hook));
    }

    /// Mutates a copy of the confirmed session and resends it. The server
    /// answers with `session.updated` later; nothing is awaited beyond the
    /// write.
    pub async fn update_session(
        &self,
        mutate: impl FnOnce(&mut Session),
    ) -> Result<(), ConversationError> {
        let mut session = lock(&self.inner.session)
            .clone()
            .ok_or(ConversationError::SessionNotEstablished)?;
        mutate(&mut session);
        self.inner.send_session(session).await
    }

    /// Sends a full session configuration without waiting for the first
    /// `session.created`, for configuration right after connecting.
    pub async fn set_session(&self, session: Session) -> Result<(), ConversationError> {
        self.inner.send_session(session).await
    }

    /// Creates a message item with a fresh client id and requests a
    /// response for it. Interrupts in-flight playback first when voice is
    /// active.
    pub async fn send_text(
        &self,
        role: MessageRole,
        text: &str,
        config: Option<ResponseConfig>,
    ) -> Result<(), ConversationError> {
        self.inner.send_text(role, text, config).await
    }

    /// Forwards raw PCM16 to the input audio buffer; `commit` forces end
    /// of turn instead of waiting for turn detection.
    pub async fn send_audio_chunk(
        &self,
        pcm: &[u8],
        commit: bool,
    ) -> Result<(), ConversationError> {
        self.inner.send_audio(pcm, commit).await
    }

    /// Submits the result of a function call the model requested. Whether
    /// to request another response is the caller's decision.
    pub async fn send_function_output(
        &self,
        output: FunctionCallOutputItem,
    ) -> Result<(), ConversationError> {
        self.inner
            .send(ClientEvent::ConversationItemCreate(
                ConversationItemCreateEvent::new(Item::FunctionCallOutput(output)),
            ))
            .await
    }

    /// Sends any protocol event as-is.
    pub async fn send_event(&self, event: ClientEvent) -> Result<(), ConversationError> {
        self.inner.send(event).await
    }

    /// Engages speaker and microphone. Idempotent; fails without an audio
    /// bridge.
    pub fn start_voice(&self) -> Result<(), ConversationError> {
        Inner::start_voice(&self.inner)
    }

    /// Releases capture and playback. Safe from any state, including
    /// during teardown.
    pub fn stop_voice(&self) {
        self.inner.stop_voice();
    }

    /// Starts feeding microphone audio into the session, engaging voice
    /// handling first if needed. Idempotent.
    pub fn start_listening(&self) -> Result<(), ConversationError> {
        Inner::start_listening(&self.inner)
    }

    /// Stops the microphone feed. Voice handling stays engaged.
    pub fn stop_listening(&self) {
        self.inner.stop_listening();
    }

    /// Halts playback, discards everything queued and tells the server how
    /// much of the current item was actually heard. A no-op while nothing
    /// is queued.
    pub async fn interrupt(&self) -> Result<(), ConversationError> {
        self.inner.interrupt().await
    }

    /// Ends the session: closes the transport and runs the disconnect path
    /// once. The transcript stays available afterwards.
    pub async fn stop(&self) {
        self.inner.connector.close().await;
        self.inner.transport_ended();
    }
}

impl Drop for Conversation {
    fn drop(&mut self) {
        self.events_task.abort();
        let was_ended = self.inner.ended.load(Ordering::SeqCst);
        self.inner.transport_ended();
        if !was_ended {
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                let connector = Arc::clone(&self.inner.connector);
                handle.spawn(async move { connector.close().await });
            }
        }
    }
}

impl Inner {
    async fn send(&self, event: ClientEvent) -> Result<(), ConversationError> {
        if self.ended.load(Ordering::SeqCst) {
            return Err(ConversationError::Disconnected);
        }
        Ok(self.connector.send(event).await?)
    }

    async fn send_session(&self, mut session: Session) -> Result<(), ConversationError> {
        // The server owns session identity.
        session.id = None;
        self.send(ClientEvent::SessionUpdate(SessionUpdateEvent::new(session)))
            .await
    }

    async fn send_text(
        &self,
        role: MessageRole,
        text: &str,
        config: Option<ResponseConfig>,
    ) -> Result<(), ConversationError> {
        let voice_active = self.snapshot.borrow().handling_voice;
        if voice_active {
            self.interrupt().await?;
        }
        let item = Item::Message(MessageItem::input_text(role, text).with_id(&fresh_item_id()));
        self.send(ClientEvent::ConversationItemCreate(
            ConversationItemCreateEvent::new(item),
        ))
        .await?;
        let mut response = ResponseCreateEvent::new();
        if let Some(config) = config {
            response = response.with_config(config);
        }
        self.send(ClientEvent::ResponseCreate(response)).await
    }

    async fn send_audio(&self, pcm: &[u8], commit: bool) -> Result<(), ConversationError> {
        self.send(ClientEvent::InputAudioBufferAppend(
            InputAudioBufferAppendEvent::new(encode_base64(pcm)),
        ))
        .await?;
        if commit {
            self.send(ClientEvent::InputAudioBufferCommit(
                InputAudioBufferCommitEvent::new(),
            ))
            .await?;
        }
        Ok(())
    }

    /// One captured chunk goes out twice: raw over the media track for
    /// transports that carry one, and base64 through the event protocol.
    async fn forward_capture(&self, pcm: &[u8]) -> Result<(), ConversationError> {
        self.connector.send_media(pcm).await?;
        self.send_audio(pcm, false).await
    }

    async fn interrupt(&self) -> Result<(), ConversationError> {
        let Some(bridge) = &self.bridge else {
            return Ok(());
        };
        let cursor = bridge.halt_playback();
        self.update_snapshot(|snapshot| snapshot.is_playing = false);
        let Some(cursor) = cursor else {
            return Ok(());
        };
        tracing::debug!(
            "truncating item {} after {}ms of playback",
            cursor.item_id,
            cursor.elapsed_ms
        );
        self.send(ClientEvent::ConversationItemTruncate(
            ConversationItemTruncateEvent::new(&cursor.item_id, 0, cursor.elapsed_ms),
        ))
        .await
    }

    fn start_voice(inner: &Arc<Self>) -> Result<(), ConversationError> {
        let Some(bridge) = &inner.bridge else {
            return Err(ConversationError::AudioUnavailable);
        };
        let mut voice = lock(&inner.voice);
        if inner.snapshot.borrow().handling_voice {
            return Ok(());
        }
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        bridge.start(notice_tx)?;
        voice.notices = Some(tokio::spawn(run_notices(Arc::downgrade(inner), notice_rx)));
        inner.update_snapshot(|snapshot| snapshot.handling_voice = true);
        Ok(())
    }

    fn start_listening(inner: &Arc<Self>) -> Result<(), ConversationError> {
        Self::start_voice(inner)?;
        let Some(bridge) = &inner.bridge else {
            return Err(ConversationError::AudioUnavailable);
        };
        let mut voice = lock(&inner.voice);
        if inner.snapshot.borrow().is_listening {
            return Ok(());
        }
        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        bridge.start_capture(chunk_tx)?;
        voice.capture = Some(tokio::spawn(run_capture(Arc::downgrade(inner), chunk_rx)));
        inner.update_snapshot(|snapshot| snapshot.is_listening = true);
        Ok(())
    }

    fn stop_listening(&self) {
        let mut voice = lock(&self.voice);
        if !self.snapshot.borrow().is_listening {
            return;
        }
        if let Some(bridge) = &self.bridge {
            bridge.stop_capture();
        }
        if let Some(task) = voice.capture.take() {
            task.abort();
        }
        self.update_snapshot(|snapshot| snapshot.is_listening = false);
    }

    fn stop_voice(&self) {
        let mut voice = lock(&self.voice);
        if !self.snapshot.borrow().handling_voice {
            return;
        }
        if let Some(bridge) = &self.bridge {
            bridge.stop_capture();
            bridge.shutdown();
        }
        if let Some(task) = voice.capture.take() {
            task.abort();
        }
        if let Some(task) = voice.notices.take() {
            task.abort();
        }
        self.update_snapshot(|snapshot| {
            snapshot.is_listening = false;
            snapshot.handling_voice = false;
            snapshot.is_playing = false;
        });
    }

    /// The one teardown path. Every trigger funnels here and only the
    /// first caller acts.
    fn transport_ended(&self) {
        if self.ended.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("realtime transport ended");
        self.stop_voice();
        self.update_snapshot(|snapshot| {
            snapshot.connected = false;
            snapshot.is_user_speaking = false;
        });
        self.ready.send_replace(ReadyState::Closed);
        let hook = lock(&self.on_disconnect).take();
        if let Some(hook) = hook {
            hook();
        }
    }

    fn report(&self, error: ConversationError) {
        let _ = self.errors_tx.send(error);
    }

    fn update_snapshot(&self, apply: impl FnOnce(&mut Snapshot)) {
        self.snapshot.send_if_modified(|snapshot| {
            let before = snapshot.clone();
            apply(snapshot);
            *snapshot != before
        });
    }

    fn queue_playback(&self, item_id: &str, pcm: &[u8]) {
        let Some(bridge) = &self.bridge else {
            return;
        };
        match bridge.enqueue(item_id, pcm) {
            Ok(()) => self.update_snapshot(|snapshot| snapshot.is_playing = true),
            Err(error) => self.report(error.into()),
        }
    }

    /// Runs `apply` on the message entry with the given id. Events for ids
    /// that never made it into the transcript fall through silently.
    fn with_message(&self, item_id: &str, apply: impl FnOnce(&mut MessageItem)) {
        let mut entries = lock(&self.entries);
        let message = entries
            .iter_mut()
            .find(|entry| entry.id() == Some(item_id))
            .and_then(Item::as_message_mut);
        if let Some(message) = message {
            apply(message);
        }
    }

    fn with_part(&self, item_id: &str, index: usize, apply: impl FnOnce(&mut ContentPart)) {
        self.with_message(item_id, |message| {
            if let Some(part) = message.content.get_mut(index) {
                apply(part);
            }
        });
    }

    fn with_function_call(&self, item_id: &str, apply: impl FnOnce(&mut FunctionCallItem)) {
        let mut entries = lock(&self.entries);
        if let Some(Item::FunctionCall(call)) = entries
            .iter_mut()
            .find(|entry| entry.id() == Some(item_id))
        {
            apply(call);
        }
    }

    async fn apply_event(&self, event: ServerEvent) {
        match event {
            ServerEvent::Error(event) => {
                tracing::error!("server error: {}", event.error());
                self.report(ConversationError::Server(event.into_error()));
            }
            ServerEvent::SessionCreated(event) => {
                *lock(&self.session) = Some(event.into_session());
                self.update_snapshot(|snapshot| snapshot.connected = true);
                self.ready.send_replace(ReadyState::Ready);
            }
            ServerEvent::SessionUpdated(event) => {
                *lock(&self.session) = Some(event.into_session());
            }
            ServerEvent::ConversationCreated(event) => {
                *lock(&self.conversation_id) = event.conversation().id().map(str::to_string);
            }
            ServerEvent::ConversationItemCreated(event) => {
                let item = event.into_item();
                let mut entries = lock(&self.entries);
                let replay = item
                    .id()
                    .is_some_and(|id| entries.iter().any(|entry| entry.id() == Some(id)));
                if !replay {
                    entries.push(item);
                }
            }
            ServerEvent::ConversationItemDeleted(event) => {
                lock(&self.entries).retain(|entry| entry.id() != Some(event.item_id()));
            }
            ServerEvent::InputAudioTranscriptionCompleted(event) => {
                self.with_part(event.item_id(), event.content_index(), |part| {
                    if let ContentPart::InputAudio { transcript, .. } = part {
                        *transcript = Some(event.transcript().to_string());
                    }
                });
            }
            ServerEvent::InputAudioTranscriptionFailed(event) => {
                self.report(ConversationError::Server(event.into_error()));
            }
            ServerEvent::ResponseContentPartAdded(event) => {
                self.with_message(event.item_id(), |message| {
                    // Out-of-range indices clamp to an append.
                    let index = event.content_index().min(message.content.len());
                    message.content.insert(index, event.part().clone());
                });
            }
            ServerEvent::ResponseContentPartDone(event) => {
                self.with_part(event.item_id(), event.content_index(), |part| {
                    merge_final_part(part, event.part());
                });
            }
            ServerEvent::ResponseTextDelta(event) => {
                self.with_part(event.item_id(), event.content_index(), |part| {
                    if let ContentPart::Text { text } = part {
                        text.push_str(event.delta());
                    }
                });
            }
            ServerEvent::ResponseTextDone(event) => {
                self.with_part(event.item_id(), event.content_index(), |part| {
                    if let ContentPart::Text { text } = part {
                        *text = event.text().to_string();
                    }
                });
            }
            ServerEvent::ResponseAudioTranscriptDelta(event) => {
                self.with_part(event.item_id(), event.content_index(), |part| {
                    if let ContentPart::Audio { transcript, .. } = part {
                        transcript
                            .get_or_insert_with(String::new)
                            .push_str(event.delta());
                    }
                });
            }
            ServerEvent::ResponseAudioTranscriptDone(event) => {
                self.with_part(event.item_id(), event.content_index(), |part| {
                    if let ContentPart::Audio { transcript, .. } = part {
                        *transcript = Some(event.transcript().to_string());
                    }
                });
            }
            ServerEvent::ResponseAudioDelta(event) => {
                let pcm = match decode_base64(event.delta()) {
                    Ok(pcm) => pcm,
                    Err(error) => {
                        self.report(error.into());
                        return;
                    }
                };
                let mut stored = false;
                self.with_part(event.item_id(), event.content_index(), |part| {
                    if let ContentPart::Audio { audio, .. } = part {
                        audio.extend_from_slice(&pcm);
                        stored = true;
                    }
                });
                if stored && self.snapshot.borrow().handling_voice {
                    self.queue_playback(event.item_id(), &pcm);
                }
            }
            ServerEvent::ResponseFunctionCallArgumentsDelta(event) => {
                self.with_function_call(event.item_id(), |call| {
                    call.arguments.push_str(event.delta());
                });
            }
            ServerEvent::ResponseFunctionCallArgumentsDone(event) => {
                self.with_function_call(event.item_id(), |call| {
                    call.arguments = event.arguments().to_string();
                });
            }
            ServerEvent::ResponseOutputItemDone(event) => {
                let item = event.into_item();
                if let Some(id) = item.id().map(str::to_string) {
                    let mut entries = lock(&self.entries);
                    if let Some(slot) = entries
                        .iter_mut()
                        .find(|entry| entry.id() == Some(id.as_str()))
                    {
                        *slot = item;
                    }
                }
            }
            ServerEvent::SpeechStarted(_) => {
                self.update_snapshot(|snapshot| snapshot.is_user_speaking = true);
                let voice_active = self.snapshot.borrow().handling_voice;
                if voice_active {
                    if let Err(error) = self.interrupt().await {
                        self.report(error);
                    }
                }
            }
            ServerEvent::SpeechStopped(_) => {
                self.update_snapshot(|snapshot| snapshot.is_user_speaking = false);
            }
            ServerEvent::Unknown => {}
        }
    }
}

async fn run_events(inner: Arc<Inner>, mut events: EventStream) {
    while let Some(event) = events.recv().await {
        match event {
            Ok(event) => inner.apply_event(event).await,
            Err(error) => inner.report(error.into()),
        }
    }
    inner.transport_ended();
}

async fn run_notices(inner: Weak<Inner>, mut notices: mpsc::UnboundedReceiver<BridgeNotice>) {
    while let Some(notice) = notices.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        match notice {
            BridgeNotice::Drained => {
                inner.update_snapshot(|snapshot| snapshot.is_playing = false);
            }
            BridgeNotice::Fault(error) => {
                tracing::warn!("audio backend fault: {error}");
                inner.report(error.into());
            }
        }
    }
}

async fn run_capture(inner: Weak<Inner>, mut chunks: mpsc::UnboundedReceiver<Bytes>) {
    while let Some(chunk) = chunks.recv().await {
        let Some(inner) = inner.upgrade() else { break };
        if let Err(error) = inner.forward_capture(&chunk).await {
            tracing::warn!("dropping captured audio: {error}");
            inner.report(error);
            break;
        }
    }
}

/// Client-assigned item ids use the same 32-character form the server
/// assigns.
fn fresh_item_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Applies a final content part over the stored one. Variants are stable
/// after creation, so a mismatched kind is dropped. Audio bytes only travel
/// in `response.audio.delta`; a final part without them keeps the
/// accumulated copy.
fn merge_final_part(slot: &mut ContentPart, done: &ContentPart) {
    match (slot, done) {
        (ContentPart::Text { text }, ContentPart::Text { text: done_text }) => {
            *text = done_text.clone();
        }
        (
            ContentPart::Audio { audio, transcript },
            ContentPart::Audio {
                audio: done_audio,
                transcript: done_transcript,
            },
        ) => {
            if !done_audio.is_empty() {
                *audio = done_audio.clone();
            }
            if done_transcript.is_some() {
                *transcript = done_transcript.clone();
            }
        }
        _ => {}
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
