//! Analysis pipeline: image validation, context assembly, request building,
//! and the inference call itself.

pub mod context;
pub mod image;
pub mod inference;
pub mod orchestrator;
pub mod request;

pub use context::{assemble, AnalysisContext, FetchError, HttpTextFetcher, TextFetcher};
pub use image::{ImageMime, ImagePayload, MAX_IMAGE_BYTES};
pub use inference::{
    classify_response, AnalysisOutcome, InferenceBackend, MockInference, OpenAiVisionClient,
};
pub use orchestrator::Analyzer;
pub use request::{build, AnalysisRequest};

use thiserror::Error;

/// Upload validation failures. Reported directly to the caller, before any
/// network activity.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("image is {size_bytes} bytes, larger than the 4 MiB limit")]
    SizeExceeded { size_bytes: u64 },

    #[error("unsupported image type (JPEG and PNG only)")]
    UnsupportedType,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request assembly failures.
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("analysis context has an empty instruction text")]
    InvalidContext,
}

/// Pipeline-level error taxonomy, as seen by the caller.
///
/// Downstream of input validation every failure collapses into the single
/// generic `AnalysisFailed`; the classified detail is preserved in the
/// tracing stream and the interaction log, never in this message.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("invalid image: {0}")]
    InvalidImage(#[from] ImageError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("there was an error analyzing the image, please try again")]
    AnalysisFailed,
}
