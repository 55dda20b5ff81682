use std::path::Path;

use crate::models::error::CaptureError;

/// Serialize an ordered sequence of sample chunks into a WAV file.
///
/// Writes the standard RIFF/fmt/data layout for integer PCM with the given
/// rate, channel count, and sample width; chunk contents are concatenated
/// in order with no resampling or re-encoding. Returns the payload byte
/// length.
///
/// The parent directory must already exist: a missing or unwritable target
/// fails with `CaptureError::Io`. Creating directories is the caller's
/// job, so a typo in an output path cannot silently spray new folders.
pub fn write_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    sample_width_bytes: u16,
    chunks: &[Vec<i16>],
) -> Result<u64, CaptureError> {
    if sample_width_bytes != 2 {
        return Err(CaptureError::Format(format!(
            "unsupported sample width: {} bytes",
            sample_width_bytes
        )));
    }

    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: sample_width_bytes * 8,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).map_err(from_hound)?;
    let mut samples_written: u64 = 0;
    for chunk in chunks {
        for &sample in chunk {
            writer.write_sample(sample).map_err(from_hound)?;
            samples_written += 1;
        }
    }
    writer.finalize().map_err(from_hound)?;

    Ok(samples_written * u64::from(sample_width_bytes))
}

/// A WAV file read back into memory, with the header fields a caller needs
/// to validate or replay it.
#[derive(Debug, Clone, PartialEq)]
pub struct WavClip {
    pub sample_rate: u32,
    pub channels: u16,
    pub bits_per_sample: u16,
    pub samples: Vec<i16>,
}

impl WavClip {
    /// Audio length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 || self.channels == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.channels) / f64::from(self.sample_rate)
    }

    /// Payload length in bytes.
    pub fn payload_bytes(&self) -> u64 {
        self.samples.len() as u64 * 2
    }
}

/// Read a WAV file, requiring signed 16-bit integer PCM.
///
/// A missing or unreadable file is `CaptureError::Io`; any other encoding
/// (float, 8/24/32-bit, compressed) is `CaptureError::Format`. Used both
/// by playback and by tests verifying the writer round-trips.
pub fn read_wav(path: &Path) -> Result<WavClip, CaptureError> {
    let reader = hound::WavReader::open(path).map_err(from_hound)?;
    let spec = reader.spec();

    if spec.sample_format != hound::SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(CaptureError::Format(format!(
            "expected 16-bit integer PCM, found {}-bit {:?}",
            spec.bits_per_sample, spec.sample_format
        )));
    }

    let samples = reader
        .into_samples::<i16>()
        .collect::<Result<Vec<i16>, _>>()
        .map_err(from_hound)?;

    Ok(WavClip {
        sample_rate: spec.sample_rate,
        channels: spec.channels,
        bits_per_sample: spec.bits_per_sample,
        samples,
    })
}

fn from_hound(err: hound::Error) -> CaptureError {
    match err {
        hound::Error::IoError(io) => CaptureError::Io(io.to_string()),
        other => CaptureError::Format(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp_chunk(len: usize, offset: i16) -> Vec<i16> {
        (0..len).map(|i| offset.wrapping_add(i as i16)).collect()
    }

    #[test]
    fn round_trip_preserves_header_and_payload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");

        let chunks = vec![ramp_chunk(1024, 0), ramp_chunk(1024, 100), ramp_chunk(1024, -7)];
        let written = write_wav(&path, 48_000, 1, 2, &chunks).unwrap();
        assert_eq!(written, 3 * 1024 * 2);

        let clip = read_wav(&path).unwrap();
        assert_eq!(clip.sample_rate, 48_000);
        assert_eq!(clip.channels, 1);
        assert_eq!(clip.bits_per_sample, 16);
        assert_eq!(clip.payload_bytes(), written);

        let expected: Vec<i16> = chunks.into_iter().flatten().collect();
        assert_eq!(clip.samples, expected);
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("does-not-exist").join("clip.wav");

        match write_wav(&path, 48_000, 1, 2, &[vec![0; 16]]) {
            Err(CaptureError::Io(_)) => {}
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        match read_wav(&dir.path().join("absent.wav")) {
            Err(CaptureError::Io(_)) => {}
            other => panic!("expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn empty_recording_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.wav");

        assert_eq!(write_wav(&path, 48_000, 1, 2, &[]).unwrap(), 0);
        let clip = read_wav(&path).unwrap();
        assert!(clip.samples.is_empty());
        assert_eq!(clip.duration_secs(), 0.0);
    }

    #[test]
    fn unsupported_width_rejected_on_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.wav");
        match write_wav(&path, 48_000, 1, 3, &[vec![0; 4]]) {
            Err(CaptureError::Format(_)) => {}
            other => panic!("expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn float_wav_rejected_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");

        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 48_000,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..64 {
            writer.write_sample(i as f32 / 64.0).unwrap();
        }
        writer.finalize().unwrap();

        match read_wav(&path) {
            Err(CaptureError::Format(_)) => {}
            other => panic!("expected Format error, got {:?}", other),
        }
    }

    #[test]
    fn duration_uses_rate_and_channels() {
        let clip = WavClip {
            sample_rate: 48_000,
            channels: 1,
            bits_per_sample: 16,
            samples: vec![0; 48_000],
        };
        approx::assert_relative_eq!(clip.duration_secs(), 1.0);
    }
}
