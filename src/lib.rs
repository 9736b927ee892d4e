pub mod cancel;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod extractor;
pub mod locator;
pub mod merger;
pub mod planner;
pub mod reducer;
pub mod remote;
pub mod render;
pub mod source;
pub mod utils;
pub mod worker;

pub use cancel::CancellationToken;
pub use error::{ErrorPayload, WaveformError, WaveformResult};
pub use events::{ChannelSink, EventSink, ProgressEvent, SessionEvents};
pub use extractor::{AmplitudeMatrix, ExtractionRequest, WaveformExtractor};
pub use locator::{Locator, SourceDescriptor};
pub use remote::MaterializeOptions;
pub use source::SampleSource;
pub use worker::{ExtractionHandle, spawn_extraction};
