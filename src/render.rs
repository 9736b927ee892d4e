//! Terminal rendering of an extracted waveform.

/// Convert amplitude to terminal block characters for visualization
pub fn amplitude_to_blocks(amplitude: f32) -> &'static str {
    let normalized = amplitude.abs().min(1.0);
    let index = (normalized * 8.0) as usize;

    match index {
        0 => " ",
        1 => "▁",
        2 => "▂",
        3 => "▃",
        4 => "▄",
        5 => "▅",
        6 => "▆",
        7 => "▇",
        _ => "█",
    }
}

/// Fit `amplitudes` into `width` columns by averaging neighbouring buckets.
/// Fewer buckets than columns are returned unchanged.
pub fn fit_to_width(amplitudes: &[f32], width: usize) -> Vec<f32> {
    if width == 0 || amplitudes.len() <= width {
        return amplitudes.to_vec();
    }

    let step = amplitudes.len() as f32 / width as f32;
    (0..width)
        .map(|i| {
            let start = (i as f32 * step) as usize;
            let end = (((i + 1) as f32 * step) as usize).min(amplitudes.len());

            if start < end {
                amplitudes[start..end].iter().sum::<f32>() / (end - start) as f32
            } else {
                0.0
            }
        })
        .collect()
}

/// One line of block characters. With `normalize` the loudest bucket fills
/// a full cell, which keeps quiet material visible.
pub fn render_blocks(amplitudes: &[f32], width: usize, normalize: bool) -> String {
    let columns = fit_to_width(amplitudes, width);
    let peak = columns.iter().copied().fold(0.0f32, f32::max);
    let scale = if normalize && peak > 0.0 { 1.0 / peak } else { 1.0 };

    columns
        .iter()
        .map(|&amplitude| amplitude_to_blocks(amplitude * scale))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amplitude_to_blocks() {
        assert_eq!(amplitude_to_blocks(0.0), " ");
        assert_eq!(amplitude_to_blocks(0.13), "▁");
        assert_eq!(amplitude_to_blocks(0.5), "▄");
        assert_eq!(amplitude_to_blocks(1.0), "█");
        assert_eq!(amplitude_to_blocks(1.5), "█"); // Should clamp to 1.0
        assert_eq!(amplitude_to_blocks(-0.9), "▇"); // Should use absolute value
    }

    #[test]
    fn test_fit_to_width_averages() {
        let fitted = fit_to_width(&[0.0, 1.0, 0.5, 0.5], 2);
        assert_eq!(fitted, vec![0.5, 0.5]);
    }

    #[test]
    fn test_fit_to_width_keeps_short_input() {
        let fitted = fit_to_width(&[0.1, 0.2], 80);
        assert_eq!(fitted, vec![0.1, 0.2]);
        assert!(fit_to_width(&[], 10).is_empty());
    }

    #[test]
    fn test_render_blocks_normalized() {
        let line = render_blocks(&[0.0, 0.25, 0.5], 80, true);
        assert_eq!(line.chars().count(), 3);
        assert!(line.ends_with('█'));

        let raw = render_blocks(&[0.0, 0.25, 0.5], 80, false);
        assert!(raw.ends_with('▄'));
    }
}
