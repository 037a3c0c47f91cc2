use std::path::PathBuf;

use image::{ImageBuffer, Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// A single decoded video frame
///
/// Thin wrapper around an RGB buffer (width × height × 3, 8-bit) with the
/// pixel helpers the filter and blend stages need. Frames are transient:
/// only the immediately preceding frame in timeline order is retained, and
/// only long enough to serve a possible transition blend.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    buffer: RgbImage,
}

impl Frame {
    /// Create a frame from an RGB image buffer
    pub fn new(buffer: RgbImage) -> Self {
        Self { buffer }
    }

    /// Create a frame filled with the given color
    pub fn new_filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let buffer = ImageBuffer::from_fn(width, height, |_, _| Rgb(color));
        Self { buffer }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.buffer.get_pixel(x, y);
        [pixel[0], pixel[1], pixel[2]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        self.buffer.put_pixel(x, y, Rgb(color));
    }

    /// Mutable access to the raw interleaved RGB bytes
    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.buffer
    }

    /// The raw interleaved RGB bytes
    pub fn as_raw(&self) -> &[u8] {
        self.buffer.as_raw()
    }

    /// Build a frame from raw interleaved RGB bytes
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        ImageBuffer::from_raw(width, height, data).map(|buffer| Self { buffer })
    }

    /// Resample to the target size with a plain (non aspect-preserving) scale
    pub fn resized(&self, width: u32, height: u32) -> Frame {
        if self.width() == width && self.height() == height {
            return self.clone();
        }

        let resized = image::imageops::resize(
            &self.buffer,
            width,
            height,
            image::imageops::FilterType::Triangle,
        );
        Frame::new(resized)
    }

    /// Linear blend of two equally sized frames
    ///
    /// `alpha` is the weight of `self`; `1 - alpha` is the weight of `other`.
    /// At `alpha = 1.0` the result is `self` bit-for-bit, at `alpha = 0.0`
    /// it is `other`.
    pub fn blended_over(&self, other: &Frame, alpha: f64) -> Frame {
        if alpha >= 1.0 {
            return self.clone();
        }
        if alpha <= 0.0 {
            return other.clone();
        }

        let mut out = self.clone();
        for (dst, &prev) in out.pixels_mut().iter_mut().zip(other.as_raw().iter()) {
            let mixed = *dst as f64 * alpha + prev as f64 * (1.0 - alpha);
            *dst = mixed.round().clamp(0.0, 255.0) as u8;
        }
        out
    }
}

/// Metadata for one source clip in the montage sequence
///
/// Created when the assembler opens the source for the first time and
/// read-only thereafter.
#[derive(Debug, Clone)]
pub struct ClipDescriptor {
    /// Path to the source file
    pub path: PathBuf,

    /// Native frame width
    pub width: u32,

    /// Native frame height
    pub height: u32,

    /// Native frame rate
    pub fps: f64,

    /// Declared number of frames
    pub frame_count: u64,

    /// Filter assigned by sequence position, filled in by the assembler
    pub filter: Option<String>,
}

impl ClipDescriptor {
    /// Nominal duration in seconds (frame_count / fps)
    pub fn duration(&self) -> f64 {
        if self.fps > 0.0 {
            self.frame_count as f64 / self.fps
        } else {
            0.0
        }
    }
}

/// The single output geometry governing the whole montage
///
/// Taken from the first clip in sequence; every later frame is resampled to
/// it before any filter or blend is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceGeometry {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
}

impl ReferenceGeometry {
    pub fn from_clip(clip: &ClipDescriptor) -> Self {
        Self {
            width: clip.width,
            height: clip.height,
            fps: clip.fps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_endpoints_exact() {
        let current = Frame::new_filled(4, 4, [200, 100, 50]);
        let previous = Frame::new_filled(4, 4, [0, 0, 0]);

        assert_eq!(current.blended_over(&previous, 1.0), current);
        assert_eq!(current.blended_over(&previous, 0.0), previous);
    }

    #[test]
    fn test_blend_midpoint_linear() {
        let current = Frame::new_filled(2, 2, [200, 100, 0]);
        let previous = Frame::new_filled(2, 2, [0, 0, 0]);

        let half = current.blended_over(&previous, 0.5);
        assert_eq!(half.get_pixel(0, 0), [100, 50, 0]);

        let quarter = current.blended_over(&previous, 0.25);
        assert_eq!(quarter.get_pixel(1, 1), [50, 25, 0]);
    }

    #[test]
    fn test_resize_noop_at_same_geometry() {
        let frame = Frame::new_filled(8, 6, [10, 20, 30]);
        let same = frame.resized(8, 6);
        assert_eq!(same, frame);
    }

    #[test]
    fn test_resize_changes_geometry() {
        let frame = Frame::new_filled(8, 6, [10, 20, 30]);
        let scaled = frame.resized(4, 4);
        assert_eq!((scaled.width(), scaled.height()), (4, 4));
        // Uniform frames stay uniform through resampling
        assert_eq!(scaled.get_pixel(2, 2), [10, 20, 30]);
    }

    #[test]
    fn test_clip_duration() {
        let clip = ClipDescriptor {
            path: PathBuf::from("a.mp4"),
            width: 640,
            height: 360,
            fps: 30.0,
            frame_count: 150,
            filter: None,
        };
        assert_eq!(clip.duration(), 5.0);
    }

    #[test]
    fn test_raw_roundtrip() {
        let frame = Frame::new_filled(2, 2, [1, 2, 3]);
        let raw = frame.as_raw().to_vec();
        let rebuilt = Frame::from_raw(2, 2, raw).unwrap();
        assert_eq!(rebuilt, frame);
    }
}
