//! cpal-backed [`AudioBridge`] for desktop hosts.
//!
//! cpal streams are not `Send`, so a dedicated engine thread owns both
//! streams and reacts to commands from the bridge handle. Device callbacks
//! only touch shared state through the playback queue mutex and the capture
//! sink slot.

use std::collections::VecDeque;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;

use bytes::Bytes;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FrameCount, StreamConfig};
use rubato::Resampler;

use crate::bridge::{AudioBridge, BridgeNotice, CaptureSink, NoticeSink};
use crate::codec::{self, WIRE_SAMPLE_RATE};
use crate::error::AudioError;
use crate::playback::{PlaybackCursor, PlaybackQueue};
use crate::resample::{create_resampler, RateConverter};

const CAPTURE_CHUNK_FRAMES: usize = 1024;
const RENDER_CHUNK_FRAMES: usize = 1024;

pub fn pick_input_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        Some(target) => host
            .input_devices()
            .map_err(|e| AudioError::Stream(e.to_string()))?
            .find(|device| device.name().is_ok_and(|n| n == target))
            .ok_or(AudioError::NoDevice),
        None => host.default_input_device().ok_or(AudioError::NoDevice),
    }
}

pub fn pick_output_device(name: Option<&str>) -> Result<cpal::Device, AudioError> {
    let host = cpal::default_host();
    match name {
        Some(target) => host
            .output_devices()
            .map_err(|e| AudioError::Stream(e.to_string()))?
            .find(|device| device.name().is_ok_and(|n| n == target))
            .ok_or(AudioError::NoDevice),
        None => host.default_output_device().ok_or(AudioError::NoDevice),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum EngineMsg {
    StartCapture,
    StopCapture,
    Resume,
    Pause,
    Drained,
    Shutdown,
}

struct EngineContext {
    input_name: Option<String>,
    output_name: Option<String>,
    queue: Arc<Mutex<PlaybackQueue>>,
    capture: Arc<Mutex<Option<CaptureSink>>>,
    render: Arc<Mutex<Option<RateConverter>>>,
    notices: NoticeSink,
    engine_tx: mpsc::Sender<EngineMsg>,
}

/// Desktop audio backend over the default (or named) cpal devices.
///
/// Playback chunks are resampled to the output device rate when they are
/// enqueued, so the realtime callback only copies frames out of the queue.
/// Captured audio is chunked, resampled to the wire rate and forwarded as
/// PCM16 from the input callback.
pub struct CpalBridge {
    input_name: Option<String>,
    output_name: Option<String>,
    queue: Arc<Mutex<PlaybackQueue>>,
    capture: Arc<Mutex<Option<CaptureSink>>>,
    render: Arc<Mutex<Option<RateConverter>>>,
    commands: Mutex<Option<mpsc::Sender<EngineMsg>>>,
    engine: Mutex<Option<JoinHandle<()>>>,
}

impl CpalBridge {
    pub fn new() -> Self {
        Self::with_devices(None, None)
    }

    /// Targets specific devices by name; `None` selects the host default.
    pub fn with_devices(input_name: Option<String>, output_name: Option<String>) -> Self {
        Self {
            input_name,
            output_name,
            queue: Arc::new(Mutex::new(PlaybackQueue::new(WIRE_SAMPLE_RATE as u32))),
            capture: Arc::new(Mutex::new(None)),
            render: Arc::new(Mutex::new(None)),
            commands: Mutex::new(None),
            engine: Mutex::new(None),
        }
    }
}

impl Default for CpalBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioBridge for CpalBridge {
    fn start(&self, notices: NoticeSink) -> Result<(), AudioError> {
        let mut commands = lock(&self.commands);
        if commands.is_some() {
            return Ok(());
        }
        let (engine_tx, engine_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let ctx = EngineContext {
            input_name: self.input_name.clone(),
            output_name: self.output_name.clone(),
            queue: Arc::clone(&self.queue),
            capture: Arc::clone(&self.capture),
            render: Arc::clone(&self.render),
            notices,
            engine_tx: engine_tx.clone(),
        };
        let handle = std::thread::Builder::new()
            .name("audio-engine".into())
            .spawn(move || run_engine(ctx, engine_rx, ready_tx))
            .map_err(|e| AudioError::Stream(e.to_string()))?;
        match ready_rx.recv() {
            Ok(Ok(())) => {
                *commands = Some(engine_tx);
                *lock(&self.engine) = Some(handle);
                Ok(())
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::EngineStopped)
            }
        }
    }

    fn shutdown(&self) {
        if let Some(commands) = lock(&self.commands).take() {
            let _ = commands.send(EngineMsg::Shutdown);
        }
        if let Some(handle) = lock(&self.engine).take() {
            let _ = handle.join();
        }
        lock(&self.capture).take();
        lock(&self.render).take();
    }

    fn start_capture(&self, sink: CaptureSink) -> Result<(), AudioError> {
        let commands = lock(&self.commands);
        let Some(commands) = commands.as_ref() else {
            return Err(AudioError::EngineStopped);
        };
        *lock(&self.capture) = Some(sink);
        commands
            .send(EngineMsg::StartCapture)
            .map_err(|_| AudioError::EngineStopped)
    }

    fn stop_capture(&self) {
        lock(&self.capture).take();
        if let Some(commands) = lock(&self.commands).as_ref() {
            let _ = commands.send(EngineMsg::StopCapture);
        }
    }

    fn enqueue(&self, item_id: &str, audio: &[u8]) -> Result<(), AudioError> {
        let samples = codec::pcm16_to_f32(audio);
        let mut render = lock(&self.render);
        let Some(converter) = render.as_mut() else {
            return Err(AudioError::EngineStopped);
        };
        let samples = converter.convert(samples)?;
        drop(render);
        lock(&self.queue).enqueue(item_id, samples);
        match lock(&self.commands).as_ref() {
            Some(commands) => commands
                .send(EngineMsg::Resume)
                .map_err(|_| AudioError::EngineStopped),
            None => Err(AudioError::EngineStopped),
        }
    }

    fn halt_playback(&self) -> Option<PlaybackCursor> {
        let cursor = lock(&self.queue).clear();
        if cursor.is_some() {
            if let Some(commands) = lock(&self.commands).as_ref() {
                let _ = commands.send(EngineMsg::Pause);
            }
        }
        cursor
    }

    fn is_playing(&self) -> bool {
        !lock(&self.queue).is_empty()
    }
}

fn run_engine(
    ctx: EngineContext,
    engine_rx: mpsc::Receiver<EngineMsg>,
    ready: mpsc::Sender<Result<(), AudioError>>,
) {
    let queue = Arc::clone(&ctx.queue);
    let notices = ctx.notices.clone();
    let streams = match build_streams(ctx) {
        Ok(streams) => streams,
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };
    let _ = ready.send(Ok(()));

    while let Ok(msg) = engine_rx.recv() {
        match msg {
            EngineMsg::StartCapture => {
                if let Err(e) = streams.input.play() {
                    let _ = notices.send(BridgeNotice::Fault(AudioError::Stream(e.to_string())));
                }
            }
            EngineMsg::StopCapture => {
                if let Err(e) = streams.input.pause() {
                    tracing::warn!("failed to pause input stream: {}", e);
                }
            }
            EngineMsg::Resume => {
                if let Err(e) = streams.output.play() {
                    let _ = notices.send(BridgeNotice::Fault(AudioError::Stream(e.to_string())));
                }
            }
            EngineMsg::Pause => {
                if let Err(e) = streams.output.pause() {
                    tracing::warn!("failed to pause output stream: {}", e);
                }
            }
            EngineMsg::Drained => {
                // Skip stale notices that raced with an enqueue.
                if lock(&queue).is_empty() {
                    if let Err(e) = streams.output.pause() {
                        tracing::warn!("failed to pause output stream: {}", e);
                    }
                    let _ = notices.send(BridgeNotice::Drained);
                }
            }
            EngineMsg::Shutdown => break,
        }
    }
}

struct EngineStreams {
    input: cpal::Stream,
    output: cpal::Stream,
}

fn build_streams(ctx: EngineContext) -> Result<EngineStreams, AudioError> {
    let input = pick_input_device(ctx.input_name.as_deref())?;
    let output = pick_output_device(ctx.output_name.as_deref())?;

    let input_config = input
        .default_input_config()
        .map_err(|e| AudioError::Stream(e.to_string()))?;
    let input_config = StreamConfig {
        channels: input_config.channels(),
        sample_rate: input_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(CAPTURE_CHUNK_FRAMES as u32)),
    };
    let output_config = output
        .default_output_config()
        .map_err(|e| AudioError::Stream(e.to_string()))?;
    let output_config = StreamConfig {
        channels: output_config.channels(),
        sample_rate: output_config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(FrameCount::from(RENDER_CHUNK_FRAMES as u32)),
    };
    tracing::debug!(
        "input: device={:?}, config={:?}",
        input.name().unwrap_or_default(),
        input_config
    );
    tracing::debug!(
        "output: device={:?}, config={:?}",
        output.name().unwrap_or_default(),
        output_config
    );

    let output_rate = output_config.sample_rate.0;
    *lock(&ctx.queue) = PlaybackQueue::new(output_rate);
    *lock(&ctx.render) = Some(RateConverter::new(
        WIRE_SAMPLE_RATE,
        f64::from(output_rate),
        RENDER_CHUNK_FRAMES,
    )?);

    let in_channels = usize::from(input_config.channels).max(1);
    let mut in_resampler = create_resampler(
        f64::from(input_config.sample_rate.0),
        WIRE_SAMPLE_RATE,
        CAPTURE_CHUNK_FRAMES,
    )?;
    let capture = Arc::clone(&ctx.capture);
    let capture_notices = ctx.notices.clone();
    let mut pending: VecDeque<f32> = VecDeque::with_capacity(CAPTURE_CHUNK_FRAMES * 2);
    let input_data_fn = move |data: &[f32], _: &cpal::InputCallbackInfo| {
        let sink = lock(&capture).clone();
        let Some(sink) = sink else {
            pending.clear();
            return;
        };
        for frame in data.chunks(in_channels) {
            pending.push_back(frame[0]);
        }
        let mut resampled: Vec<f32> = vec![];
        while pending.len() >= CAPTURE_CHUNK_FRAMES {
            let chunk: Vec<f32> = pending.drain(..CAPTURE_CHUNK_FRAMES).collect();
            match in_resampler.process(&[chunk], None) {
                Ok(mut out) => {
                    if let Some(channel) = out.pop() {
                        resampled.extend(channel);
                    }
                }
                Err(e) => {
                    let _ = capture_notices.send(BridgeNotice::Fault(e.into()));
                    return;
                }
            }
        }
        if resampled.is_empty() {
            return;
        }
        if sink.send(Bytes::from(codec::f32_to_pcm16(&resampled))).is_err() {
            // Receiver went away; stop forwarding until the next start.
            lock(&capture).take();
        }
    };
    let input_stream = input
        .build_input_stream(
            &input_config,
            input_data_fn,
            |err| tracing::warn!("an error occurred on input stream: {}", err),
            None,
        )
        .map_err(|e| AudioError::Stream(e.to_string()))?;
    input_stream
        .pause()
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    let out_channels = usize::from(output_config.channels).max(1);
    let queue = Arc::clone(&ctx.queue);
    let engine_tx = ctx.engine_tx.clone();
    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        data.fill(0.0);
        let frames = data.len() / out_channels;
        let mut mono = vec![0.0f32; frames];
        let (wrote, empty) = {
            let mut queue = lock(&queue);
            let wrote = queue.fill(&mut mono);
            (wrote, queue.is_empty())
        };
        let mut sample_index = 0;
        for sample in mono {
            // L channel (ch:0)
            if sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            // R channel (ch:1)
            if out_channels > 1 && sample_index < data.len() {
                data[sample_index] = sample;
                sample_index += 1;
            }
            // ignore other channels
            sample_index += out_channels.saturating_sub(2);
        }
        if wrote > 0 && empty {
            let _ = engine_tx.send(EngineMsg::Drained);
        }
    };
    let output_stream = output
        .build_output_stream(
            &output_config,
            output_data_fn,
            |err| tracing::warn!("an error occurred on output stream: {}", err),
            None,
        )
        .map_err(|e| AudioError::Stream(e.to_string()))?;
    output_stream
        .pause()
        .map_err(|e| AudioError::Stream(e.to_string()))?;

    Ok(EngineStreams {
        input: input_stream,
        output: output_stream,
    })
}
