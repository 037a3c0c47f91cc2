use crate::config::FilterSettings;
use crate::error::Result;
use crate::filters::traits::Filter;
use crate::video::types::Frame;

/// Movie-like color grade: linear contrast lift followed by desaturation
///
/// First `out = clamp(in * contrast + 10)` per channel, then the frame is
/// taken through HSV, the saturation channel is scaled, and converted back.
pub struct CinematicFilter;

const DEFAULT_CONTRAST: f64 = 1.2;
const DEFAULT_SATURATION: f64 = 0.85;
const BRIGHTNESS_OFFSET: f64 = 10.0;

impl CinematicFilter {
    pub fn new() -> Self {
        Self
    }
}

impl Filter for CinematicFilter {
    fn name(&self) -> &str {
        "cinematic"
    }

    fn description(&self) -> &str {
        "Movie-like color grading filter"
    }

    fn apply(&self, frame: &mut Frame, settings: &FilterSettings) -> Result<()> {
        let contrast = settings.param_or("contrast", DEFAULT_CONTRAST);
        let saturation = settings.param_or("saturation", DEFAULT_SATURATION);

        for value in frame.pixels_mut().iter_mut() {
            let lifted = *value as f64 * contrast + BRIGHTNESS_OFFSET;
            *value = lifted.round().clamp(0.0, 255.0) as u8;
        }

        for chunk in frame.pixels_mut().chunks_exact_mut(3) {
            let (h, s, v) = rgb_to_hsv([chunk[0], chunk[1], chunk[2]]);
            let graded = hsv_to_rgb(h, (s * saturation).clamp(0.0, 1.0), v);
            chunk.copy_from_slice(&graded);
        }

        Ok(())
    }
}

/// RGB [0,255] to (hue degrees, saturation [0,1], value [0,1])
fn rgb_to_hsv(rgb: [u8; 3]) -> (f64, f64, f64) {
    let r = rgb[0] as f64 / 255.0;
    let g = rgb[1] as f64 / 255.0;
    let b = rgb[2] as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let s = if max == 0.0 { 0.0 } else { delta / max };

    (h, s, max)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
        (c, x, 0.0)
    } else if h < 120.0 {
        (x, c, 0.0)
    } else if h < 180.0 {
        (0.0, c, x)
    } else if h < 240.0 {
        (0.0, x, c)
    } else if h < 300.0 {
        (x, 0.0, c)
    } else {
        (c, 0.0, x)
    };

    [
        ((r + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((g + m) * 255.0).round().clamp(0.0, 255.0) as u8,
        ((b + m) * 255.0).round().clamp(0.0, 255.0) as u8,
    ]
}
