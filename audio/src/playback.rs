use std::collections::VecDeque;

/// Position reached in the response item that was playing when the queue
/// was cleared. `elapsed_ms` counts every frame of that item handed to the
/// output device, across all of its queued chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackCursor {
    pub item_id: String,
    pub elapsed_ms: u64,
}

struct Segment {
    item_id: String,
    samples: Vec<f32>,
    cursor: usize,
}

/// Ordered queue of decoded assistant audio, consumed frame-by-frame by the
/// output device callback.
///
/// The play counter for an item survives the queue draining, so an item
/// whose audio arrives in several deltas reports the full time played when
/// a later chunk is interrupted. The counter resets as soon as a different
/// item starts playing.
pub struct PlaybackQueue {
    segments: VecDeque<Segment>,
    played: Option<(String, u64)>,
    sample_rate: u32,
}

impl PlaybackQueue {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            segments: VecDeque::new(),
            played: None,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn enqueue(&mut self, item_id: &str, samples: Vec<f32>) {
        if samples.is_empty() {
            return;
        }
        self.segments.push_back(Segment {
            item_id: item_id.to_string(),
            samples,
            cursor: 0,
        });
    }

    /// Copies queued frames into `out`, zero-filling whatever the queue
    /// cannot cover, and returns the number of real frames written.
    pub fn fill(&mut self, out: &mut [f32]) -> usize {
        let mut written = 0;
        while written < out.len() {
            let Some(segment) = self.segments.front_mut() else {
                break;
            };
            let available = segment.samples.len() - segment.cursor;
            let take = available.min(out.len() - written);
            out[written..written + take]
                .copy_from_slice(&segment.samples[segment.cursor..segment.cursor + take]);
            segment.cursor += take;
            written += take;
            let exhausted = segment.cursor == segment.samples.len();
            let item_id = segment.item_id.clone();
            self.note_played(&item_id, take as u64);
            if exhausted {
                self.segments.pop_front();
            }
        }
        out[written..].fill(0.0);
        written
    }

    /// Drops all queued audio. Returns where playback stood in the item at
    /// the head of the queue, or `None` when nothing was queued.
    pub fn clear(&mut self) -> Option<PlaybackCursor> {
        let head = self.segments.front()?;
        let item_id = head.item_id.clone();
        let elapsed_frames = match &self.played {
            Some((id, frames)) if *id == item_id => *frames,
            _ => 0,
        };
        self.segments.clear();
        self.played = None;
        Some(PlaybackCursor {
            item_id,
            elapsed_ms: elapsed_frames * 1000 / u64::from(self.sample_rate),
        })
    }

    fn note_played(&mut self, item_id: &str, frames: u64) {
        match &mut self.played {
            Some((id, total)) if id == item_id => *total += frames,
            other => *other = Some((item_id.to_string(), frames)),
        }
    }
}
