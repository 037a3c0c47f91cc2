//! # Beat-Montage
//!
//! Assemble short video clips into a single montage cut in time with a music
//! track.
//!
//! The pipeline extracts a beat grid from the audio, walks the clip sequence
//! (intro, user clips, outro) in order, applies a rotating color filter per
//! clip, cross-blends frames that land near a beat, and muxes the music onto
//! the silent intermediate stream.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use beat_montage::{
//!     config::Config,
//!     montage::MontageAssembler,
//!     video::FfmpegBackend,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let backend = FfmpegBackend::new()?;
//!
//! let assembler = MontageAssembler::new(config, Box::new(backend));
//! let clips = vec![
//!     PathBuf::from("clip1.mp4"),
//!     PathBuf::from("clip2.mp4"),
//!     PathBuf::from("clip3.mp4"),
//! ];
//! let duration = assembler
//!     .build_montage(
//!         &clips,
//!         Path::new("intro.mp4"),
//!         Path::new("outro.mp4"),
//!         Path::new("song.mp3"),
//!         Path::new("montage.mp4"),
//!     )
//!     .await?;
//! println!("montage is {:.2}s long", duration);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`audio`] - Audio decoding and beat grid extraction
//! - [`filters`] - Per-clip color filters and the rotation order
//! - [`montage`] - The sequential assembly pipeline
//! - [`video`] - Frame types and the external media backend
//! - [`config`] - Configuration management
//!
//! ## Custom Filters
//!
//! New color filters implement the [`Filter`](filters::Filter) trait and are
//! registered with the [`FilterRegistry`](filters::FilterRegistry):
//!
//! ```rust,no_run
//! use beat_montage::config::FilterSettings;
//! use beat_montage::error::Result;
//! use beat_montage::filters::Filter;
//! use beat_montage::video::Frame;
//!
//! struct Sepia;
//!
//! impl Filter for Sepia {
//!     fn name(&self) -> &str {
//!         "sepia"
//!     }
//!
//!     fn description(&self) -> &str {
//!         "Warm brown monochrome"
//!     }
//!
//!     fn apply(&self, frame: &mut Frame, settings: &FilterSettings) -> Result<()> {
//!         // Your color transform
//!         Ok(())
//!     }
//! }
//! ```

pub mod audio;
pub mod config;
pub mod error;
pub mod filters;
pub mod montage;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    audio::{BeatAnalyzer, BeatGrid},
    config::Config,
    error::{MontageError, Result},
    filters::{Filter, FilterRegistry},
    montage::MontageAssembler,
};
