//! Capture-to-playback plumbing for duplex streams.
//!
//! Backends that drive capture and playback as two independent callbacks (as
//! cpal does) bridge them with an `rtrb` ring of mono samples:
//!
//! ```text
//! capture callback ──▶ CaptureWriter ──▶ rtrb ring ──▶ PlaybackRenderer ──▶ playback callback
//!   (interleaved)        (channel 0)                    (AudioCallback,
//!                                                        fan out to all channels)
//! ```
//!
//! Both halves are allocation-free after construction. When the ring holds
//! fewer frames than the playback block needs, the block is rendered as
//! silence and the ring is left to refill. When capture runs ahead of playback
//! (two devices on separate clocks), the oldest samples beyond
//! [`BACKLOG_BLOCKS`] blocks are discarded before each pull, which bounds the
//! added latency.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::processor::AudioCallback;

/// Blocks of headroom kept in the ring.
const RING_BLOCKS: usize = 8;

/// Smallest ring capacity in samples.
const MIN_RING_CAPACITY: usize = 4096;

/// Blocks of queued capture kept beyond the block being pulled.
pub const BACKLOG_BLOCKS: usize = 2;

/// Create a connected capture/playback pair.
///
/// `block_frames` sizes the scratch buffers; playback blocks larger than that
/// are processed in several passes.
pub fn duplex_pair(
    block_frames: usize,
    input_channels: usize,
    output_channels: usize,
    callback: Box<dyn AudioCallback>,
) -> (CaptureWriter, PlaybackRenderer) {
    let block_frames = block_frames.max(1);
    let capacity = (block_frames * RING_BLOCKS).max(MIN_RING_CAPACITY);
    let (producer, consumer) = RingBuffer::<f32>::new(capacity);
    (
        CaptureWriter {
            producer,
            channels: input_channels.max(1),
        },
        PlaybackRenderer {
            consumer,
            callback,
            channels: output_channels.max(1),
            max_backlog: block_frames * BACKLOG_BLOCKS,
            input: vec![0.0; block_frames],
            output: vec![0.0; block_frames],
        },
    )
}

/// Capture half: pushes the first channel of each frame into the ring.
pub struct CaptureWriter {
    producer: Producer<f32>,
    channels: usize,
}

impl CaptureWriter {
    /// Push one interleaved capture buffer. Samples that do not fit are dropped.
    pub fn write(&mut self, data: &[f32]) {
        for frame in data.chunks(self.channels) {
            if let Some(&sample) = frame.first()
                && self.producer.push(sample).is_err()
            {
                break;
            }
        }
    }
}

/// Playback half: pulls mono input, runs the callback, fans out to all channels.
pub struct PlaybackRenderer {
    consumer: Consumer<f32>,
    callback: Box<dyn AudioCallback>,
    channels: usize,
    max_backlog: usize,
    input: Vec<f32>,
    output: Vec<f32>,
}

impl PlaybackRenderer {
    /// Fill one interleaved playback buffer.
    pub fn render(&mut self, data: &mut [f32]) {
        let pass_len = self.input.len() * self.channels;
        for pass in data.chunks_mut(pass_len) {
            let frames = pass.len() / self.channels;
            if !self.pull(frames) {
                pass.fill(0.0);
                continue;
            }

            let input = &self.input[..frames];
            let output = &mut self.output[..frames];
            self.callback.process(input, output);

            for (frame, &sample) in pass.chunks_mut(self.channels).zip(output.iter()) {
                frame.fill(sample);
            }
            // Trailing partial frame, if the host hands us one.
            pass[frames * self.channels..].fill(0.0);
        }
    }

    /// Samples waiting in the ring.
    pub fn available(&self) -> usize {
        self.consumer.slots()
    }

    fn pull(&mut self, frames: usize) -> bool {
        let excess = self
            .consumer
            .slots()
            .saturating_sub(frames + self.max_backlog);
        if excess > 0
            && let Ok(stale) = self.consumer.read_chunk(excess)
        {
            stale.commit_all();
        }

        let Ok(chunk) = self.consumer.read_chunk(frames) else {
            return false;
        };
        let (first, second) = chunk.as_slices();
        self.input[..first.len()].copy_from_slice(first);
        self.input[first.len()..frames].copy_from_slice(second);
        chunk.commit_all();
        true
    }
}
