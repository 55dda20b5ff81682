use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Result of a capture session that produced a WAV file.
///
/// Serializable so front ends can render or export it directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordingOutcome {
    /// Id of the session that produced the file.
    pub session_id: String,

    /// Where the clip was written.
    pub file_path: PathBuf,

    /// Chunks captured before the loop ended.
    pub chunks_captured: usize,

    /// Raw PCM bytes in the data sub-chunk.
    pub payload_bytes: u64,

    /// Recorded audio length in seconds (frames over sample rate).
    pub duration_secs: f64,

    /// True when the take was cut short by cancellation. The partial file
    /// is still valid and the take still counts as a success.
    pub cancelled: bool,

    /// Chunks lost to input overflow while recording. Informational.
    pub dropped_chunks: usize,

    /// RFC 3339 timestamp of when the file was finalized.
    pub finished_at: String,
}

impl RecordingOutcome {
    pub fn new(
        session_id: String,
        file_path: PathBuf,
        chunks_captured: usize,
        payload_bytes: u64,
        duration_secs: f64,
        cancelled: bool,
        dropped_chunks: usize,
    ) -> Self {
        Self {
            session_id,
            file_path,
            chunks_captured,
            payload_bytes,
            duration_secs,
            cancelled,
            dropped_chunks,
            finished_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
