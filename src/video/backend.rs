use std::path::Path;

use crate::error::Result;
use crate::video::types::{ClipDescriptor, Frame, ReferenceGeometry};

/// Sequential frame reader for one opened clip
pub trait FrameSource {
    /// Metadata for the opened clip
    fn descriptor(&self) -> &ClipDescriptor;

    /// Read the next frame, or `None` at end of stream
    fn read_frame(&mut self) -> Result<Option<Frame>>;
}

/// Sequential frame writer for the intermediate silent stream
pub trait FrameSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;

    /// Flush and close the stream; must be called before the file is used
    fn finish(&mut self) -> Result<()>;
}

/// Narrow decode/encode interface the assembler works against
///
/// Keeps the montage algorithm free of any direct codec dependency: open a
/// clip, read frames, write frames, mux, probe. The production
/// implementation shells out to ffmpeg; tests substitute an in-memory
/// backend.
pub trait MediaBackend {
    /// Open a video source for sequential decoding
    fn open_clip(&self, path: &Path) -> Result<Box<dyn FrameSource>>;

    /// Create a silent video sink at the reference geometry
    fn open_sink(&self, path: &Path, geometry: &ReferenceGeometry) -> Result<Box<dyn FrameSink>>;

    /// Re-encode and combine the silent video with the music track, trimmed
    /// to the shorter of the two streams
    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()>;

    /// True duration of a finished container in seconds
    fn probe_duration(&self, path: &Path) -> Result<f64>;
}
