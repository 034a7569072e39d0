//! Error types for the frame extraction pipeline.
//!
//! Every failure surfaces as an [`ExtractError`]; the UI maps each variant to
//! one of its fixed user-facing messages and stays interactive.

use std::{io::Error as IoError, path::PathBuf, time::Duration};

use image::ImageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The file's declared media type is not a video.
    #[error("Not a video file: {path} (declared type {media_type})")]
    InvalidFileType {
        path: PathBuf,
        media_type: String,
    },

    /// The decoder could not load the media at all: unreadable file,
    /// no video stream, or unknown duration.
    #[error("Failed to load media: {reason}")]
    DecodeLoad { reason: String },

    /// The decoder reported an error while positioning on the last frame.
    #[error("Seek failed: {reason}")]
    Seek { reason: String },

    /// Neither a frame nor a decoder error arrived within the fixed wait.
    #[error("Seek did not complete within {}s", .timeout.as_secs())]
    SeekTimeout { timeout: Duration },

    /// The attempt was superseded and its decoder process reaped.
    #[error("Extraction cancelled")]
    Cancelled,

    /// Anything else that breaks the extraction workflow, like a worker
    /// task failure or a frame buffer of the wrong size.
    #[error("Extraction failed: {reason}")]
    Extraction { reason: String },

    /// PNG encoding of the rendered frame failed.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),

    /// Launching or talking to a media tool process failed.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),
}
