use crate::config::FilterSettings;
use crate::error::Result;
use crate::filters::traits::{tint_blend, Filter};
use crate::video::types::Frame;

/// Cool blue tint (RGB layer [20, 60, 128])
pub struct CoolFilter;

const COOL_LAYER: [u8; 3] = [20, 60, 128];

const DEFAULT_INTENSITY: f64 = 0.4;

impl CoolFilter {
    pub fn new() -> Self {
        Self
    }
}

impl Filter for CoolFilter {
    fn name(&self) -> &str {
        "cool"
    }

    fn description(&self) -> &str {
        "Cool blue tint filter"
    }

    fn apply(&self, frame: &mut Frame, settings: &FilterSettings) -> Result<()> {
        let intensity = settings.param_or("intensity", DEFAULT_INTENSITY);
        tint_blend(frame, COOL_LAYER, intensity);
        Ok(())
    }
}
