use crate::config::FilterSettings;
use crate::error::Result;
use crate::filters::traits::{tint_blend, Filter};
use crate::video::types::Frame;

/// Warm orange/red tint (RGB layer [115, 40, 20])
pub struct WarmFilter;

/// Tint layer in RGB order. The weight comes from the `intensity` parameter.
const WARM_LAYER: [u8; 3] = [115, 40, 20];

const DEFAULT_INTENSITY: f64 = 0.4;

impl WarmFilter {
    pub fn new() -> Self {
        Self
    }
}

impl Filter for WarmFilter {
    fn name(&self) -> &str {
        "warm"
    }

    fn description(&self) -> &str {
        "Warm orange/red tint filter"
    }

    fn apply(&self, frame: &mut Frame, settings: &FilterSettings) -> Result<()> {
        let intensity = settings.param_or("intensity", DEFAULT_INTENSITY);
        tint_blend(frame, WARM_LAYER, intensity);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warm_shifts_toward_red() {
        let mut frame = Frame::new_filled(2, 2, [100, 100, 100]);
        let settings = FilterSettings::enabled_with(&[("intensity", 0.4)]);

        WarmFilter::new().apply(&mut frame, &settings).unwrap();

        let [r, g, b] = frame.get_pixel(0, 0);
        assert!(r > g && g > b);
        assert_eq!(r, 146); // 100 + 115 * 0.4
    }

    #[test]
    fn test_warm_default_intensity() {
        let mut with_default = Frame::new_filled(1, 1, [50, 50, 50]);
        let mut with_explicit = with_default.clone();

        WarmFilter::new()
            .apply(&mut with_default, &FilterSettings::enabled_with(&[]))
            .unwrap();
        WarmFilter::new()
            .apply(&mut with_explicit, &FilterSettings::enabled_with(&[("intensity", 0.4)]))
            .unwrap();

        assert_eq!(with_default, with_explicit);
    }
}
