/// RMS loudness of one chunk of signed 16-bit PCM, scaled to 0..=100.
///
/// Pure and stateless: squares are accumulated in f64 so the largest chunk
/// cannot overflow, the root-mean-square is normalized by the full-scale
/// amplitude (32768), scaled to a percentage, truncated, and clamped at
/// 100. Empty and all-zero chunks both read 0.
pub fn compute_level(chunk: &[i16]) -> u8 {
    if chunk.is_empty() {
        return 0;
    }
    let sum_sq: f64 = chunk
        .iter()
        .map(|&s| {
            let v = f64::from(s);
            v * v
        })
        .sum();
    let rms = (sum_sq / chunk.len() as f64).sqrt();
    (rms / 32768.0 * 100.0).min(100.0) as u8
}
