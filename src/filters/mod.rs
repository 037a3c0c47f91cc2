//! # Filter System
//!
//! Stateless per-frame color transforms selected by name.
//!
//! ## Built-in Filters
//!
//! - **warm**: orange/red tint layer blended at `intensity`
//! - **cool**: blue tint layer blended at `intensity`
//! - **cinematic**: contrast/brightness lift plus HSV desaturation
//!
//! Unknown names pass frames through untouched, so filter assignment can
//! never break a montage.

pub mod registry;
pub mod traits;

pub mod cinematic;
pub mod cool;
pub mod warm;

pub use cinematic::CinematicFilter;
pub use cool::CoolFilter;
pub use registry::FilterRegistry;
pub use traits::Filter;
pub use warm::WarmFilter;

/// Fixed filter rotation applied by sequence position
const FILTER_ROTATION: [&str; 3] = ["warm", "cool", "cinematic"];

/// Filter assigned to the clip at `index` in the montage sequence
///
/// A pure position-based policy (intro is index 0). Alternative policies
/// can be substituted here without touching the blend or timeline logic.
pub fn filter_for_index(index: usize) -> &'static str {
    FILTER_ROTATION[index % FILTER_ROTATION.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_cycles() {
        assert_eq!(filter_for_index(0), "warm");
        assert_eq!(filter_for_index(1), "cool");
        assert_eq!(filter_for_index(2), "cinematic");
        assert_eq!(filter_for_index(3), "warm");
        assert_eq!(filter_for_index(7), "cool");
    }
}
