//! Root-mean-square reduction of one bucket of one channel.

/// RMS over the first `frame_count` samples of `samples`.
///
/// `frame_count` is the number of frames actually delivered for the bucket,
/// which can be below the planned span at the end of the stream. Squares are
/// accumulated in `f64`. An empty bucket reduces to exactly `0.0`.
pub fn reduce(samples: &[f32], frame_count: usize) -> f32 {
    let samples = &samples[..frame_count.min(samples.len())];
    if samples.is_empty() {
        return 0.0;
    }

    let sum_of_squares: f64 = samples
        .iter()
        .map(|&s| {
            let s = f64::from(s);
            s * s
        })
        .sum();

    (sum_of_squares / samples.len() as f64).sqrt() as f32
}
