//! Combining per-channel amplitudes into the single displayed waveform.
//!
//! Two channels that both carry data are averaged. Otherwise the first
//! channel with data wins, checking channel 0 before channel 1; any further
//! channels never contribute. No data at all is an error.

use crate::error::{WaveformError, WaveformResult};

pub const MERGE_ERROR_MESSAGE: &str = "no channel data";

/// Merge one bucket. `None` marks a channel without data.
pub fn merge(amplitudes: &[Option<f32>]) -> WaveformResult<f32> {
    match amplitudes {
        [Some(left), Some(right)] => Ok((left + right) / 2.0),
        _ => amplitudes
            .iter()
            .take(2)
            .flatten()
            .next()
            .copied()
            .ok_or_else(no_channel_data),
    }
}

/// Merge whole channel sequences element-wise. Empty sequences count as
/// channels without data.
pub fn merge_channels(channels: &[Vec<f32>]) -> WaveformResult<Vec<f32>> {
    let with_data = |index: usize| channels.get(index).filter(|c| !c.is_empty());

    match (channels.len(), with_data(0), with_data(1)) {
        (2, Some(left), Some(right)) => Ok(left
            .iter()
            .zip(right)
            .map(|(l, r)| (l + r) / 2.0)
            .collect()),
        (_, Some(only), _) | (_, None, Some(only)) => Ok(only.clone()),
        _ => Err(no_channel_data()),
    }
}

fn no_channel_data() -> WaveformError {
    WaveformError::Merge(MERGE_ERROR_MESSAGE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_channels_are_averaged() {
        assert!((merge(&[Some(0.4), Some(0.6)]).unwrap() - 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_single_channel_passes_through() {
        assert_eq!(merge(&[Some(0.4), None]).unwrap(), 0.4);
        assert_eq!(merge(&[None, Some(0.7)]).unwrap(), 0.7);
        assert_eq!(merge(&[Some(0.3)]).unwrap(), 0.3);
    }

    #[test]
    fn test_no_data_is_merge_error() {
        let err = merge(&[None, None]).unwrap_err();
        assert_eq!(err.code(), "MERGE_ERROR");
        assert_eq!(err.to_string(), MERGE_ERROR_MESSAGE);
        assert!(merge(&[]).is_err());
    }

    #[test]
    fn test_more_than_two_channels_uses_first() {
        assert_eq!(merge(&[Some(0.2), Some(0.4), Some(0.9)]).unwrap(), 0.2);
        assert!(merge(&[None, None, Some(0.9)]).is_err());
    }

    #[test]
    fn test_merge_channels_stereo() {
        let merged = merge_channels(&[vec![0.4, 0.0, 1.0], vec![0.6, 0.2, 0.0]]).unwrap();
        assert_eq!(merged.len(), 3);
        assert!((merged[0] - 0.5).abs() < 1e-7);
        assert!((merged[1] - 0.1).abs() < 1e-7);
        assert!((merged[2] - 0.5).abs() < 1e-7);
    }

    #[test]
    fn test_merge_channels_prefers_channel_zero() {
        assert_eq!(
            merge_channels(&[vec![0.4, 0.3], vec![]]).unwrap(),
            vec![0.4, 0.3]
        );
        assert_eq!(
            merge_channels(&[vec![], vec![0.8, 0.1]]).unwrap(),
            vec![0.8, 0.1]
        );
        assert_eq!(merge_channels(&[vec![0.9]]).unwrap(), vec![0.9]);
    }

    #[test]
    fn test_merge_channels_without_data() {
        assert!(merge_channels(&[vec![], vec![]]).is_err());
        assert!(merge_channels(&[]).is_err());
    }
}
