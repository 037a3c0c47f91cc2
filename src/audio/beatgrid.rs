use std::path::Path;

use tracing::{debug, info, warn};

use crate::audio::loader::AudioLoader;
use crate::config::AudioConfig;

/// An ordered sequence of beat timestamps for one montage job
///
/// Built once per job from the music track (or synthesized) and never
/// mutated afterwards. Detected beats may contain near-duplicates when the
/// onset envelope is noisy; queries tolerate that.
#[derive(Debug, Clone)]
pub struct BeatGrid {
    beats: Vec<f64>,

    /// Estimated tempo in BPM, when enough beats exist to measure one
    tempo: Option<f64>,
}

impl BeatGrid {
    /// Build a grid from detected beat timestamps
    pub fn from_beats(beats: Vec<f64>) -> Self {
        let tempo = estimate_tempo(&beats);
        Self { beats, tempo }
    }

    /// Generate evenly spaced beats at the given BPM
    ///
    /// Emits every `t = k * 60/bpm` with `0 <= t < duration`. Timestamps are
    /// computed by multiplication so the grid is exactly reproducible.
    pub fn synthetic(duration: f64, bpm: f64) -> Self {
        let interval = 60.0 / bpm;
        let beats: Vec<f64> = (0u64..)
            .map(|k| k as f64 * interval)
            .take_while(|&t| t < duration)
            .collect();

        info!("Generated {} synthetic beats at {} BPM", beats.len(), bpm);

        Self {
            beats,
            tempo: Some(bpm),
        }
    }

    /// Beat timestamps in seconds, in order
    pub fn beats(&self) -> &[f64] {
        &self.beats
    }

    /// Estimated tempo in BPM
    pub fn tempo(&self) -> Option<f64> {
        self.tempo
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }

    /// Find the beat nearest to a time point
    ///
    /// On an exact tie the earlier beat wins. Returns `None` on an empty grid.
    pub fn nearest_beat(&self, time: f64) -> Option<f64> {
        let mut best: Option<(f64, f64)> = None;

        for &beat in &self.beats {
            let distance = (beat - time).abs();
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((beat, distance)),
            }
        }

        best.map(|(beat, _)| beat)
    }

    /// All beats within `[start, end]`, inclusive of both bounds
    pub fn beats_in_range(&self, start: f64, end: f64) -> Vec<f64> {
        self.beats
            .iter()
            .copied()
            .filter(|&b| b >= start && b <= end)
            .collect()
    }
}

/// Energy-based beat detector
///
/// Computes an RMS onset envelope over the decoded track and peak-picks it
/// under a maximum-tempo distance constraint. Decode failures and empty peak
/// sets fall back to a deterministic synthetic grid so a malformed music
/// file never blocks montage creation.
pub struct BeatAnalyzer {
    config: AudioConfig,
}

impl BeatAnalyzer {
    pub fn new(config: AudioConfig) -> Self {
        Self { config }
    }

    /// Analyze a music file and return its beat grid
    pub async fn analyze<P: AsRef<Path>>(&self, path: P) -> BeatGrid {
        let path = path.as_ref();
        info!("Analyzing beats in audio file: {}", path.display());

        let audio = match AudioLoader::load(path).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(
                    "Audio decode failed ({}), falling back to {} BPM synthetic grid",
                    e, self.config.default_bpm
                );
                return BeatGrid::synthetic(self.config.fallback_duration, self.config.default_bpm);
            }
        };

        let mono = audio.mono_samples();
        let beats = self.detect_beats(&mono, audio.sample_rate);

        if beats.is_empty() {
            warn!(
                "No beats detected, falling back to {} BPM synthetic grid over {:.1}s",
                self.config.default_bpm, audio.duration
            );
            return BeatGrid::synthetic(audio.duration, self.config.default_bpm);
        }

        let grid = BeatGrid::from_beats(beats);
        info!(
            "Detected {} beats{}",
            grid.len(),
            grid.tempo()
                .map(|bpm| format!(", estimated tempo {:.1} BPM", bpm))
                .unwrap_or_default()
        );
        grid
    }

    /// Detect beat timestamps in a mono signal
    fn detect_beats(&self, samples: &[f32], sample_rate: u32) -> Vec<f64> {
        let envelope = self.onset_envelope(samples, sample_rate);
        if envelope.is_empty() {
            return Vec::new();
        }

        let window_samples = (self.config.onset_window * sample_rate as f64) as usize;
        let hop_samples = (window_samples / 2).max(1);

        // Envelope values per second of audio; the distance constraint caps
        // detections at max_bpm.
        let envelope_rate = sample_rate as f64 / hop_samples as f64;
        let min_distance = (envelope_rate / (self.config.max_bpm / 60.0)) as usize;

        let peaks = find_peaks(&envelope, min_distance.max(1), self.config.min_prominence as f32);

        debug!(
            "Onset envelope: {} values, {} peaks after distance/prominence constraints",
            envelope.len(),
            peaks.len()
        );

        // Map envelope indices back through the original signal length
        let samples_per_envelope = samples.len() as f64 / envelope.len() as f64;
        peaks
            .into_iter()
            .map(|idx| (idx as f64 * samples_per_envelope) / sample_rate as f64)
            .collect()
    }

    /// Sliding RMS energy, normalized to [0, 1] by the envelope maximum
    fn onset_envelope(&self, samples: &[f32], sample_rate: u32) -> Vec<f32> {
        let window_samples = (self.config.onset_window * sample_rate as f64) as usize;
        let hop_samples = (window_samples / 2).max(1);

        if window_samples == 0 || samples.len() < window_samples {
            return Vec::new();
        }

        let mut envelope: Vec<f32> = samples
            .windows(window_samples)
            .step_by(hop_samples)
            .map(|window| {
                (window.iter().map(|&x| x * x).sum::<f32>() / window.len() as f32).sqrt()
            })
            .collect();

        let max = envelope.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 {
            for value in &mut envelope {
                *value /= max;
            }
        }

        envelope
    }
}

/// Pick local maxima with minimum-distance and minimum-prominence constraints
///
/// Prominence is measured against the higher of the two valley floors found
/// walking outwards until a taller sample (or the signal edge) is reached.
/// When two candidates fall within `min_distance`, the taller one survives.
fn find_peaks(values: &[f32], min_distance: usize, min_prominence: f32) -> Vec<usize> {
    let mut candidates = Vec::new();

    for i in 1..values.len().saturating_sub(1) {
        if values[i] > values[i - 1] && values[i] >= values[i + 1] {
            let prominence = peak_prominence(values, i);
            if prominence >= min_prominence {
                candidates.push(i);
            }
        }
    }

    // Tallest-first suppression of neighbors inside the distance window
    candidates.sort_by(|&a, &b| values[b].partial_cmp(&values[a]).unwrap_or(std::cmp::Ordering::Equal));

    let mut kept: Vec<usize> = Vec::new();
    for idx in candidates {
        if kept.iter().all(|&k| k.abs_diff(idx) >= min_distance) {
            kept.push(idx);
        }
    }

    kept.sort_unstable();
    kept
}

fn peak_prominence(values: &[f32], peak: usize) -> f32 {
    let height = values[peak];

    let mut left_base = height;
    for i in (0..peak).rev() {
        if values[i] > height {
            break;
        }
        left_base = left_base.min(values[i]);
    }

    let mut right_base = height;
    for &value in &values[peak + 1..] {
        if value > height {
            break;
        }
        right_base = right_base.min(value);
    }

    height - left_base.max(right_base)
}

/// Tempo estimate: 60 / median of consecutive beat intervals
fn estimate_tempo(beats: &[f64]) -> Option<f64> {
    if beats.len() < 2 {
        return None;
    }

    let mut intervals: Vec<f64> = beats.windows(2).map(|pair| pair[1] - pair[0]).collect();
    intervals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mid = intervals.len() / 2;
    let median = if intervals.len() % 2 == 0 {
        (intervals[mid - 1] + intervals[mid]) / 2.0
    } else {
        intervals[mid]
    };

    if median > 0.0 {
        Some(60.0 / median)
    } else {
        None
    }
}
