use crate::config::FilterSettings;
use crate::error::Result;
use crate::video::types::Frame;

/// Core trait implemented by every color filter
///
/// Filters are stateless, pure functions of the frame and their settings:
/// the same input frame and parameters always produce the same output.
pub trait Filter: Send + Sync {
    /// Unique name of this filter
    fn name(&self) -> &str;

    /// Human-readable description
    fn description(&self) -> &str;

    /// Apply the color transform to a frame in place
    ///
    /// All channel arithmetic saturates at [0, 255]; values never wrap.
    /// Parameters missing from `settings` use the filter's documented
    /// defaults.
    fn apply(&self, frame: &mut Frame, settings: &FilterSettings) -> Result<()>;
}

/// Saturating add of a constant color layer scaled by `intensity`
///
/// `out = clamp(frame + layer * intensity)`, per channel. Shared by the
/// warm and cool tint filters.
pub fn tint_blend(frame: &mut Frame, layer: [u8; 3], intensity: f64) {
    let offsets = [
        layer[0] as f64 * intensity,
        layer[1] as f64 * intensity,
        layer[2] as f64 * intensity,
    ];

    for (i, value) in frame.pixels_mut().iter_mut().enumerate() {
        let mixed = *value as f64 + offsets[i % 3];
        *value = mixed.round().clamp(0.0, 255.0) as u8;
    }
}
