//! # Video Module
//!
//! Frame buffers, clip metadata, and the narrow decode/encode interface the
//! assembler works against. The production backend shells out to ffmpeg.

pub mod backend;
pub mod ffmpeg;
pub mod types;

pub use backend::{FrameSink, FrameSource, MediaBackend};
pub use ffmpeg::FfmpegBackend;
pub use types::{ClipDescriptor, Frame, ReferenceGeometry};
