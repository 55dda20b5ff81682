//! Turns raw device callbacks into fixed-size mono chunks.
//!
//! Device callbacks deliver interleaved buffers of whatever length and
//! channel count the host picked. The assembler downmixes to mono,
//! accumulates across callbacks, and forwards exactly `chunk_frames`
//! samples per message, dropping (and counting) chunks when the session
//! falls behind instead of ever blocking the audio callback.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crossbeam_channel::TrySendError;

use clip_recorder_core::ChunkSender;

pub(crate) struct ChunkAssembler {
    chunk_frames: usize,
    channels: usize,
    pending: VecDeque<i16>,
    chunks: ChunkSender,
    dropped: Arc<AtomicUsize>,
}

impl ChunkAssembler {
    pub(crate) fn new(
        chunk_frames: usize,
        channels: usize,
        chunks: ChunkSender,
        dropped: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            chunk_frames,
            channels,
            pending: VecDeque::with_capacity(chunk_frames * 2),
            chunks,
            dropped,
        }
    }

    /// Feed one interleaved callback buffer.
    ///
    /// Multi-channel input is downmixed by averaging each frame. A trailing
    /// partial chunk stays pending until later callbacks complete it; it is
    /// never sent short.
    pub(crate) fn push(&mut self, interleaved: &[i16]) {
        if self.channels <= 1 {
            self.pending.extend(interleaved.iter().copied());
        } else {
            self.pending
                .extend(interleaved.chunks_exact(self.channels).map(|frame| {
                    let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
                    (sum / self.channels as i32) as i16
                }));
        }

        while self.pending.len() >= self.chunk_frames {
            let chunk: Vec<i16> = self.pending.drain(..self.chunk_frames).collect();
            match self.chunks.try_send(chunk) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    self.dropped.fetch_add(1, Ordering::Relaxed);
                }
                // Session is gone; the stream is about to be torn down.
                Err(TrySendError::Disconnected(_)) => {}
            }
        }
    }
}

pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

pub(crate) fn u16_to_i16(sample: u16) -> i16 {
    (i32::from(sample) - 32768) as i16
}

pub(crate) fn i16_to_f32(sample: i16) -> f32 {
    f32::from(sample) / 32768.0
}

pub(crate) fn i16_to_u16(sample: i16) -> u16 {
    (i32::from(sample) + 32768) as u16
}
