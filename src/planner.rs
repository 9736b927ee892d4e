//! Partitioning of a frame stream into a fixed number of output buckets.
//!
//! A plan maps `total_frames` onto `samples_per_pixel` buckets of
//! `total_frames / samples_per_pixel` frames each (integer division). Only the
//! scalar bounds are computed up front; the buckets themselves are produced
//! lazily by [`BucketCursor`], which shrinks the trailing span so that reads
//! after the first never run past the end of the stream.

use crate::error::{WaveformError, WaveformResult};

pub const RANGE_ERROR_MESSAGE: &str =
    "offset is larger than total length. Please select less number of samples";

/// Scalar bounds of one extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPlan {
    pub start_bucket: usize,
    pub end_bucket: usize,
    pub frames_per_bucket: u64,
    /// Frame the first bucket is read from
    pub start_frame: u64,
    pub total_frames: u64,
}

/// One output pixel and the frame span it reduces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub index: usize,
    pub start_frame: u64,
    pub frame_count: u64,
}

/// Compute the bucket range of an extraction.
///
/// * `offset` - `Some(n)` with `n >= 0` starts at bucket `n`. `None` starts at
///   the bucket holding `current_position` and reads from that exact frame;
///   a negative offset starts that many buckets before it.
/// * `length_limit` - maximum number of buckets past the start.
pub fn plan(
    total_frames: u64,
    samples_per_pixel: usize,
    offset: Option<i64>,
    length_limit: Option<u64>,
    current_position: u64,
) -> WaveformResult<BucketPlan> {
    let samples_per_pixel = samples_per_pixel.max(1);
    let frames_per_bucket = total_frames / samples_per_pixel as u64;

    let start_bucket = match offset {
        Some(offset) if offset >= 0 => usize::try_from(offset).unwrap_or(usize::MAX),
        _ => {
            let current = current_position
                .checked_div(frames_per_bucket)
                .unwrap_or(0);
            let back = offset.map(i64::unsigned_abs).unwrap_or(0);
            usize::try_from(current.saturating_sub(back)).unwrap_or(usize::MAX)
        }
    };

    let end_bucket = match length_limit {
        Some(length) => {
            let length = usize::try_from(length).unwrap_or(usize::MAX);
            start_bucket.saturating_add(length)
        }
        None => samples_per_pixel,
    }
    .min(samples_per_pixel);

    if start_bucket > end_bucket {
        return Err(WaveformError::Range(RANGE_ERROR_MESSAGE.to_string()));
    }

    let start_frame = match offset {
        None => current_position,
        Some(_) => (start_bucket as u64).saturating_mul(frames_per_bucket),
    };

    Ok(BucketPlan {
        start_bucket,
        end_bucket,
        frames_per_bucket,
        start_frame,
        total_frames,
    })
}

impl BucketPlan {
    pub fn bucket_count(&self) -> usize {
        self.end_bucket - self.start_bucket
    }

    /// Lazily walk the buckets of this plan
    pub fn buckets(&self) -> BucketCursor {
        BucketCursor {
            next_index: self.start_bucket,
            end_bucket: self.end_bucket,
            start_frame: self.start_frame,
            frames_per_bucket: self.frames_per_bucket,
            total_frames: self.total_frames,
            exhausted: self.frames_per_bucket == 0,
        }
    }
}

/// Iterator over the buckets of a [`BucketPlan`].
///
/// After each bucket the start frame advances by the current span; once the
/// next span would overrun the stream it is cut down to the frames left, and
/// iteration stops when nothing is left.
#[derive(Debug, Clone)]
pub struct BucketCursor {
    next_index: usize,
    end_bucket: usize,
    start_frame: u64,
    frames_per_bucket: u64,
    total_frames: u64,
    exhausted: bool,
}

impl Iterator for BucketCursor {
    type Item = Bucket;

    fn next(&mut self) -> Option<Bucket> {
        if self.exhausted || self.next_index >= self.end_bucket {
            return None;
        }

        let bucket = Bucket {
            index: self.next_index,
            start_frame: self.start_frame,
            frame_count: self.frames_per_bucket,
        };

        self.next_index += 1;
        self.start_frame = self.start_frame.saturating_add(self.frames_per_bucket);
        if self.start_frame.saturating_add(self.frames_per_bucket) > self.total_frames {
            self.frames_per_bucket = self.total_frames.saturating_sub(self.start_frame);
            if self.frames_per_bucket == 0 {
                self.exhausted = true;
            }
        }

        Some(bucket)
    }
}
