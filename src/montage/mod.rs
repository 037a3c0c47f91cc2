//! Montage assembly
//!
//! Walks the clip sequence in order, resamples every frame to the reference
//! geometry, applies the rotating color filter, blends frames that fall
//! inside a beat's transition window with the previous output frame, and
//! hands the silent intermediate stream to the mux stage.

pub mod assembler;

pub use assembler::{MontageAssembler, MontageTimeline};
