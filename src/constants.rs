//! Project-wide constants used across multiple modules.
//!
//! This module centralizes constant definitions to avoid duplication and ensure
//! consistency between the engine, the event payloads and the CLI.

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Domain tag carried by every error payload
pub const ERROR_DOMAIN: &str = "AudioWaveforms";

/// Event emitted after every processed bucket
pub const EVENT_EXTRACTION_PROGRESS: &str = "onCurrentExtractedWaveformData";

/// Payload keys of the progress event
pub const KEY_WAVEFORM_DATA: &str = "waveformData";
pub const KEY_PROGRESS: &str = "progress";
pub const KEY_SESSION_KEY: &str = "sessionKey";

/// Bucket count used when the caller does not ask for one
pub const DEFAULT_SAMPLES_PER_PIXEL: usize = 100;

/// Bound on loading remote asset metadata
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// Bound on exporting a remote asset into a local container
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 60;

/// Supported audio file extensions
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac"];

/// Suffix of the sidecar written by `zim-waveform batch`
pub const WAVEFORM_SIDECAR_SUFFIX: &str = "waveform.json";

/// Prefix of every temporary file created while materializing remote audio
pub const TEMP_FILE_PREFIX: &str = "zim-waveform-";
