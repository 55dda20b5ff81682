use thiserror::Error;

/// Errors that can occur during device queries, capture, and playback.
///
/// Variants carry cloneable strings so they can travel through session
/// events and be compared in tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The audio subsystem could not be initialized or enumerated.
    #[error("device query failed: {0}")]
    DeviceQuery(String),

    /// A device could not be opened, rejected the requested stream format,
    /// or disappeared mid-session.
    #[error("device open failed: {0}")]
    DeviceOpen(String),

    /// Input data arrived faster than it was consumed and chunks were
    /// dropped. Never terminal: sessions count it, log it, and carry on.
    #[error("input overflow: {dropped_chunks} chunk(s) dropped")]
    Overflow { dropped_chunks: usize },

    /// File read/write failure, including a missing target directory.
    #[error("i/o error: {0}")]
    Io(String),

    /// The WAV container is malformed or not the supported encoding.
    #[error("format error: {0}")]
    Format(String),

    /// A session of the same kind is already active.
    #[error("session busy: {0}")]
    SessionBusy(String),

    #[error("configuration invalid: {0}")]
    InvalidConfig(String),
}
