//! # Audio Module
//!
//! Decodes the music track and extracts the beat grid that times the
//! montage's cross-fade transitions.
//!
//! Beat detection is deliberately simple: an RMS onset envelope with
//! distance- and prominence-constrained peak picking. When decoding fails or
//! nothing is detected, a deterministic synthetic grid at the configured
//! default BPM takes over so montage creation never blocks on a bad file.

pub mod beatgrid;
pub mod loader;

pub use beatgrid::{BeatAnalyzer, BeatGrid};
pub use loader::{AudioData, AudioLoader};
