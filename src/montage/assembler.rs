use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    audio::{BeatAnalyzer, BeatGrid},
    config::Config,
    error::{InputError, Result, VideoError},
    filters::{filter_for_index, FilterRegistry},
    video::{ClipDescriptor, Frame, MediaBackend, ReferenceGeometry},
};

/// Assembles clips into a beat-synchronized montage
///
/// One assembler serves one job at a time: the beat grid, timeline offset,
/// and previous-frame buffer all live on the call stack of `build_montage`,
/// so separate assembler instances can run jobs in parallel without shared
/// state.
///
/// The pipeline is a single sequential chain: beat extraction, clip decode,
/// filter application, blend, frame write, and final mux all happen in
/// order, with every external tool invocation blocking.
pub struct MontageAssembler {
    config: Config,
    backend: Box<dyn MediaBackend>,
    filters: FilterRegistry,
}

impl MontageAssembler {
    pub fn new(config: Config, backend: Box<dyn MediaBackend>) -> Self {
        Self {
            config,
            backend,
            filters: FilterRegistry::new(),
        }
    }

    /// Build the montage and return the final container's duration in seconds
    ///
    /// The sequence is intro + clips (in the given order) + outro. Clip count
    /// is validated before any filesystem work; video decode or encode
    /// failures abort the job with temporary artifacts removed.
    pub async fn build_montage(
        &self,
        clips: &[PathBuf],
        intro: &Path,
        outro: &Path,
        music: &Path,
        output: &Path,
    ) -> Result<f64> {
        let bounds = &self.config.montage;
        if clips.len() < bounds.min_clips || clips.len() > bounds.max_clips {
            return Err(InputError::ClipCount {
                count: clips.len(),
                min: bounds.min_clips,
                max: bounds.max_clips,
            }
            .into());
        }

        let mut sequence: Vec<PathBuf> = Vec::with_capacity(clips.len() + 2);
        sequence.push(intro.to_path_buf());
        sequence.extend(clips.iter().cloned());
        sequence.push(outro.to_path_buf());

        info!(
            "Building montage from {} clips (plus intro/outro) -> {}",
            clips.len(),
            output.display()
        );

        // One beat grid per job; decode trouble falls back internally
        let analyzer = BeatAnalyzer::new(self.config.audio.clone());
        let grid = analyzer.analyze(music).await;

        let temp_video = PathBuf::from(format!("{}.temp.avi", output.display()));

        let result = self.assemble(&sequence, &grid, music, &temp_video, output);

        // Intermediate stream is removed on success and failure alike
        remove_if_exists(&temp_video);
        if result.is_err() {
            remove_if_exists(output);
        }

        result
    }

    /// Sequential decode/filter/blend/write pass over the whole sequence
    fn assemble(
        &self,
        sequence: &[PathBuf],
        grid: &BeatGrid,
        music: &Path,
        temp_video: &Path,
        output: &Path,
    ) -> Result<f64> {
        let half_window = self.config.montage.transition_duration / 2.0;

        // First clip in sequence fixes the output geometry
        let first_source = self.backend.open_clip(&sequence[0])?;
        let geometry = ReferenceGeometry::from_clip(first_source.descriptor());
        if geometry.fps <= 0.0 {
            return Err(VideoError::InvalidParameters {
                details: format!("non-positive frame rate in {}", sequence[0].display()),
            }
            .into());
        }

        let mut sink = self.backend.open_sink(temp_video, &geometry)?;
        let mut pending_first = Some(first_source);
        let mut timeline = MontageTimeline::new();
        let mut prev_frame: Option<Frame> = None;

        for (index, path) in sequence.iter().enumerate() {
            let mut source = match pending_first.take() {
                Some(source) => source,
                None => self.backend.open_clip(path)?,
            };

            let mut clip: ClipDescriptor = source.descriptor().clone();
            clip.filter = Some(filter_for_index(index).to_string());

            debug!(
                "Processing {} with filter '{}' at offset {:.2}s",
                clip.path.display(),
                clip.filter.as_deref().unwrap_or("none"),
                timeline.offset()
            );

            let mut frame_index = 0u64;
            while let Some(frame) = source.read_frame()? {
                let mut frame = frame.resized(geometry.width, geometry.height);
                self.filters.process(&mut frame, clip.filter.as_deref(), &self.config)?;

                let timestamp = timeline.absolute_time(frame_index, geometry.fps);

                let written = match (grid.nearest_beat(timestamp), prev_frame.as_ref()) {
                    (Some(beat), Some(prev)) => {
                        let distance = (timestamp - beat).abs();
                        if distance < half_window {
                            // alpha -> 1 at the beat, -> 0 at the window edge
                            let alpha = 1.0 - distance / half_window;
                            frame.blended_over(prev, alpha)
                        } else {
                            frame
                        }
                    }
                    _ => frame,
                };

                sink.write_frame(&written)?;
                prev_frame = Some(written);
                frame_index += 1;
            }

            info!("Completed {}: {} frames", clip.path.display(), frame_index);

            // Offsets advance by nominal clip duration, not decode progress,
            // so declared-vs-decoded frame count discrepancies are absorbed.
            timeline.advance(clip.duration());

            if !self.config.montage.carry_blend_across_clips {
                prev_frame = None;
            }
        }

        sink.finish()?;

        self.backend.mux(temp_video, music, output)?;

        let duration = self.backend.probe_duration(output)?;
        info!("Montage created successfully, duration {:.2}s", duration);
        Ok(duration)
    }
}

/// Cumulative timeline offset for converting clip-local frame indices into
/// absolute timestamps for beat lookup
#[derive(Debug, Clone, Default)]
pub struct MontageTimeline {
    offset: f64,
}

impl MontageTimeline {
    pub fn new() -> Self {
        Self { offset: 0.0 }
    }

    /// Current offset in seconds
    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Absolute timestamp of a clip-local frame index
    pub fn absolute_time(&self, frame_index: u64, fps: f64) -> f64 {
        self.offset + frame_index as f64 / fps
    }

    /// Advance past a completed clip
    pub fn advance(&mut self, clip_duration: f64) {
        self.offset += clip_duration;
    }
}

fn remove_if_exists(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MontageError;
    use crate::video::backend::{FrameSink, FrameSource};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    #[test]
    fn test_timeline_offsets() {
        let mut timeline = MontageTimeline::new();
        assert_eq!(timeline.absolute_time(0, 30.0), 0.0);
        assert_eq!(timeline.absolute_time(15, 30.0), 0.5);

        timeline.advance(2.0);
        timeline.advance(5.0);
        assert_eq!(timeline.offset(), 7.0);
        assert_eq!(timeline.absolute_time(30, 30.0), 8.0);
    }

    // ==========================================
    // In-memory media backend
    // ==========================================

    #[derive(Clone, Copy)]
    struct MockClip {
        width: u32,
        height: u32,
        fps: f64,
        frames: u64,
        color: [u8; 3],
    }

    #[derive(Default)]
    struct MockRecorder {
        written: Vec<Frame>,
        sink_geometry: Option<ReferenceGeometry>,
        finished: bool,
    }

    struct MockBackend {
        clips: HashMap<PathBuf, MockClip>,
        recorder: Arc<Mutex<MockRecorder>>,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                clips: HashMap::new(),
                recorder: Arc::new(Mutex::new(MockRecorder::default())),
            }
        }

        fn with_clip(mut self, path: &str, clip: MockClip) -> Self {
            self.clips.insert(PathBuf::from(path), clip);
            self
        }
    }

    struct MockSource {
        descriptor: ClipDescriptor,
        color: [u8; 3],
        remaining: u64,
    }

    impl FrameSource for MockSource {
        fn descriptor(&self) -> &ClipDescriptor {
            &self.descriptor
        }

        fn read_frame(&mut self) -> Result<Option<Frame>> {
            if self.remaining == 0 {
                return Ok(None);
            }
            self.remaining -= 1;
            Ok(Some(Frame::new_filled(
                self.descriptor.width,
                self.descriptor.height,
                self.color,
            )))
        }
    }

    struct MockSink {
        path: PathBuf,
        recorder: Arc<Mutex<MockRecorder>>,
    }

    impl FrameSink for MockSink {
        fn write_frame(&mut self, frame: &Frame) -> Result<()> {
            self.recorder.lock().unwrap().written.push(frame.clone());
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            let mut recorder = self.recorder.lock().unwrap();
            recorder.finished = true;
            std::fs::write(&self.path, b"silent-intermediate")?;
            Ok(())
        }
    }

    impl MediaBackend for MockBackend {
        fn open_clip(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
            let clip = self.clips.get(path).ok_or_else(|| VideoError::ProbeFailed {
                path: path.display().to_string(),
            })?;

            Ok(Box::new(MockSource {
                descriptor: ClipDescriptor {
                    path: path.to_path_buf(),
                    width: clip.width,
                    height: clip.height,
                    fps: clip.fps,
                    frame_count: clip.frames,
                    filter: None,
                },
                color: clip.color,
                remaining: clip.frames,
            }))
        }

        fn open_sink(&self, path: &Path, geometry: &ReferenceGeometry) -> Result<Box<dyn FrameSink>> {
            self.recorder.lock().unwrap().sink_geometry = Some(*geometry);
            Ok(Box::new(MockSink {
                path: path.to_path_buf(),
                recorder: Arc::clone(&self.recorder),
            }))
        }

        fn mux(&self, video: &Path, _audio: &Path, output: &Path) -> Result<()> {
            if !video.exists() {
                return Err(VideoError::MuxFailed {
                    reason: "intermediate stream missing".to_string(),
                }
                .into());
            }
            std::fs::write(output, b"muxed-montage")?;
            Ok(())
        }

        fn probe_duration(&self, _path: &Path) -> Result<f64> {
            let recorder = self.recorder.lock().unwrap();
            let geometry = recorder.sink_geometry.ok_or_else(|| VideoError::ProbeFailed {
                path: "no sink opened".to_string(),
            })?;
            Ok(recorder.written.len() as f64 / geometry.fps)
        }
    }

    fn clip(frames: u64, color: [u8; 3]) -> MockClip {
        MockClip {
            width: 640,
            height: 360,
            fps: 30.0,
            frames,
            color,
        }
    }

    fn standard_backend() -> MockBackend {
        MockBackend::new()
            .with_clip("intro.mp4", clip(60, [200, 0, 0]))
            .with_clip("a.mp4", clip(150, [0, 200, 0]))
            .with_clip("b.mp4", clip(150, [0, 0, 200]))
            .with_clip("c.mp4", clip(150, [200, 200, 0]))
            .with_clip("outro.mp4", clip(60, [200, 0, 200]))
    }

    fn body_clips() -> Vec<PathBuf> {
        vec![PathBuf::from("a.mp4"), PathBuf::from("b.mp4"), PathBuf::from("c.mp4")]
    }

    #[tokio::test]
    async fn test_end_to_end_duration() {
        // 2 + 5 + 5 + 5 + 2 seconds at 30 fps; music decode fails, forcing
        // the synthetic 120 BPM fallback grid
        let dir = tempdir().unwrap();
        let output = dir.path().join("montage.mp4");

        let assembler = MontageAssembler::new(Config::default(), Box::new(standard_backend()));

        let duration = assembler
            .build_montage(
                &body_clips(),
                Path::new("intro.mp4"),
                Path::new("outro.mp4"),
                Path::new("missing-music.mp3"),
                &output,
            )
            .await
            .unwrap();

        let frame = 1.0 / 30.0;
        assert!((duration - 19.0).abs() <= frame, "duration was {}", duration);
        assert!(output.exists());
        assert!(std::fs::metadata(&output).unwrap().len() > 0);

        // Intermediate stream is gone
        let temp = PathBuf::from(format!("{}.temp.avi", output.display()));
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_idempotent_duration() {
        let dir = tempdir().unwrap();

        let mut durations = Vec::new();
        for run in 0..2 {
            let output = dir.path().join(format!("montage_{}.mp4", run));
            let assembler = MontageAssembler::new(Config::default(), Box::new(standard_backend()));
            let duration = assembler
                .build_montage(
                    &body_clips(),
                    Path::new("intro.mp4"),
                    Path::new("outro.mp4"),
                    Path::new("missing-music.mp3"),
                    &output,
                )
                .await
                .unwrap();
            durations.push(duration);
        }

        assert_eq!(durations[0], durations[1]);
    }

    #[tokio::test]
    async fn test_clip_count_validation() {
        let dir = tempdir().unwrap();

        for count in [2usize, 7] {
            let output = dir.path().join("montage.mp4");
            let assembler = MontageAssembler::new(Config::default(), Box::new(standard_backend()));

            let clips: Vec<PathBuf> = (0..count).map(|i| PathBuf::from(format!("{}.mp4", i))).collect();
            let result = assembler
                .build_montage(
                    &clips,
                    Path::new("intro.mp4"),
                    Path::new("outro.mp4"),
                    Path::new("missing-music.mp3"),
                    &output,
                )
                .await;

            assert!(matches!(
                result,
                Err(MontageError::Input(InputError::ClipCount { .. }))
            ));
            // No filesystem writes were performed
            assert!(!output.exists());
            assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
        }
    }

    #[tokio::test]
    async fn test_video_decode_failure_is_fatal_and_cleans_up() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("montage.mp4");

        // "b.mp4" is not registered with the backend
        let backend = MockBackend::new()
            .with_clip("intro.mp4", clip(60, [200, 0, 0]))
            .with_clip("a.mp4", clip(150, [0, 200, 0]))
            .with_clip("c.mp4", clip(150, [200, 200, 0]))
            .with_clip("outro.mp4", clip(60, [200, 0, 200]));

        let assembler = MontageAssembler::new(Config::default(), Box::new(backend));
        let result = assembler
            .build_montage(
                &body_clips(),
                Path::new("intro.mp4"),
                Path::new("outro.mp4"),
                Path::new("missing-music.mp3"),
                &output,
            )
            .await;

        assert!(matches!(result, Err(MontageError::Video(_))));
        assert!(!output.exists());
        let temp = PathBuf::from(format!("{}.temp.avi", output.display()));
        assert!(!temp.exists());
    }

    #[tokio::test]
    async fn test_later_clips_resampled_to_reference_geometry() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("montage.mp4");

        let mut odd = clip(150, [0, 200, 0]);
        odd.width = 1920;
        odd.height = 1080;

        let backend = MockBackend::new()
            .with_clip("intro.mp4", clip(60, [200, 0, 0]))
            .with_clip("a.mp4", odd)
            .with_clip("b.mp4", clip(150, [0, 0, 200]))
            .with_clip("c.mp4", clip(150, [200, 200, 0]))
            .with_clip("outro.mp4", clip(60, [200, 0, 200]));
        let recorder = Arc::clone(&backend.recorder);

        let assembler = MontageAssembler::new(Config::default(), Box::new(backend));
        assembler
            .build_montage(
                &body_clips(),
                Path::new("intro.mp4"),
                Path::new("outro.mp4"),
                Path::new("missing-music.mp3"),
                &output,
            )
            .await
            .unwrap();

        let recorder = recorder.lock().unwrap();
        assert_eq!(
            recorder.sink_geometry.unwrap(),
            ReferenceGeometry { width: 640, height: 360, fps: 30.0 }
        );
        for frame in &recorder.written {
            assert_eq!((frame.width(), frame.height()), (640, 360));
        }
    }

    /// Runs a montage and returns the frames written to the sink
    async fn run_and_capture(config: Config) -> Vec<Frame> {
        let dir = tempdir().unwrap();
        let output = dir.path().join("montage.mp4");

        // Intro is 63 frames (2.1s) so the first body-clip frame lands 0.1s
        // after a synthetic beat, inside the blend window
        let backend = MockBackend::new()
            .with_clip("intro.mp4", clip(63, [240, 0, 0]))
            .with_clip("a.mp4", clip(150, [0, 240, 0]))
            .with_clip("b.mp4", clip(150, [0, 0, 240]))
            .with_clip("c.mp4", clip(150, [240, 240, 0]))
            .with_clip("outro.mp4", clip(60, [240, 0, 240]));
        let recorder = Arc::clone(&backend.recorder);

        let assembler = MontageAssembler::new(config, Box::new(backend));
        assembler
            .build_montage(
                &body_clips(),
                Path::new("intro.mp4"),
                Path::new("outro.mp4"),
                Path::new("missing-music.mp3"),
                &output,
            )
            .await
            .unwrap();

        let frames = recorder.lock().unwrap().written.clone();
        frames
    }

    fn identity_filter_config() -> Config {
        let mut config = Config::default();
        for settings in config.filters.values_mut() {
            settings.enabled = false;
        }
        config
    }

    #[tokio::test]
    async fn test_blend_carries_across_clip_boundary() {
        let config = identity_filter_config();
        let frames = run_and_capture(config).await;

        // Frame 63 is the first body-clip frame at t = 2.1s; nearest beat is
        // 2.0s, distance 0.1, alpha 0.6 -> blended with the last intro frame
        let boundary = frames[63].get_pixel(0, 0);
        assert_ne!(boundary, [0, 240, 0]);
        assert!(boundary[0] > 0, "expected intro red carried into the blend");
    }

    #[tokio::test]
    async fn test_blend_reset_at_clip_boundary_when_disabled() {
        let mut config = identity_filter_config();
        config.montage.carry_blend_across_clips = false;
        let frames = run_and_capture(config).await;

        // Without carry there is no previous frame at the cut, so the first
        // body-clip frame is written unblended
        assert_eq!(frames[63].get_pixel(0, 0), [0, 240, 0]);
    }

    #[tokio::test]
    async fn test_filter_rotation_applied_per_clip() {
        let config = Config::default();
        let frames = run_and_capture(config).await;

        // Intro (index 0) gets the warm tint: red channel raised from 240
        // toward saturation, green/blue lifted by the layer
        let intro_pixel = frames[0].get_pixel(0, 0);
        assert_eq!(intro_pixel, [255, 16, 8]);
    }
}
