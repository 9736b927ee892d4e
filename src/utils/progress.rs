//! Progress indicators shared by the CLI commands.
//!
//! Extraction reports progress as a fraction of buckets, batch runs as a
//! count of files, and remote materialization has no measurable progress at
//! all, so each gets its own styling here.

use crate::constants::SPINNER_CHARS;
use indicatif::{ProgressBar, ProgressStyle};

/// Resolution of [`create_extraction_bar`]
pub const PROGRESS_TICKS: u64 = 1000;

/// Spinner for work without a known length, such as fetching remote audio
pub fn create_progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(SPINNER_CHARS),
    );
    spinner
}

/// Bar counting whole items, used by `batch`
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    pb
}

/// Bar driven by a fraction in `[0, 1]`, see [`set_fraction`]
pub fn create_extraction_bar() -> ProgressBar {
    let pb = ProgressBar::new(PROGRESS_TICKS);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {percent:>3}% {msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );
    pb
}

pub fn set_fraction(pb: &ProgressBar, fraction: f64) {
    let ticks = (fraction.clamp(0.0, 1.0) * PROGRESS_TICKS as f64).round() as u64;
    pb.set_position(ticks);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_progress_spinner() {
        let spinner = create_progress_spinner();
        spinner.set_message("Fetching");
        spinner.finish_and_clear();
    }

    #[test]
    fn test_create_progress_bar() {
        let pb = create_progress_bar(100);
        pb.set_position(50);
        assert_eq!(pb.length(), Some(100));
        pb.finish();
    }

    #[test]
    fn test_set_fraction() {
        let pb = create_extraction_bar();
        set_fraction(&pb, 0.25);
        assert_eq!(pb.position(), 250);

        set_fraction(&pb, 1.7);
        assert_eq!(pb.position(), PROGRESS_TICKS);
        pb.finish_and_clear();
    }
}
