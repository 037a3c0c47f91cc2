use std::io::{Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, info, warn};

use crate::error::{Result, VideoError};
use crate::video::backend::{FrameSink, FrameSource, MediaBackend};
use crate::video::types::{ClipDescriptor, Frame, ReferenceGeometry};

/// Media backend built on external `ffmpeg`/`ffprobe` processes
///
/// Frames travel as raw RGB24 over the child process pipes, so no codec
/// library is linked. Every invocation is a blocking call.
pub struct FfmpegBackend;

impl FfmpegBackend {
    /// Create a backend, verifying that ffmpeg is on the PATH
    pub fn new() -> Result<Self> {
        let output = Command::new("ffmpeg")
            .arg("-version")
            .output()
            .map_err(|_| VideoError::ProbeFailed {
                path: "ffmpeg command not found".to_string(),
            })?;

        if output.status.success() {
            debug!("ffmpeg available");
            Ok(Self)
        } else {
            Err(VideoError::ProbeFailed {
                path: "ffmpeg command failed".to_string(),
            }
            .into())
        }
    }

    fn probe_clip(&self, path: &Path) -> Result<ClipDescriptor> {
        let output = Command::new("ffprobe")
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .output()
            .map_err(|_| VideoError::ProbeFailed {
                path: path.display().to_string(),
            })?;

        if !output.status.success() {
            return Err(VideoError::ProbeFailed {
                path: path.display().to_string(),
            }
            .into());
        }

        let json = String::from_utf8(output.stdout).map_err(|_| VideoError::ProbeFailed {
            path: path.display().to_string(),
        })?;

        let width = extract_json_number(&json, "width").ok_or_else(|| VideoError::ProbeFailed {
            path: path.display().to_string(),
        })? as u32;
        let height = extract_json_number(&json, "height").ok_or_else(|| VideoError::ProbeFailed {
            path: path.display().to_string(),
        })? as u32;
        let fps = extract_fps(&json).unwrap_or(30.0);
        let duration = extract_json_number(&json, "duration").unwrap_or(0.0);
        let frame_count = extract_json_number(&json, "nb_frames")
            .map(|n| n as u64)
            .unwrap_or_else(|| (duration * fps).round() as u64);

        info!(
            "Probed {}: {}x{} @ {:.2} fps, {} frames",
            path.display(),
            width,
            height,
            fps,
            frame_count
        );

        Ok(ClipDescriptor {
            path: path.to_path_buf(),
            width,
            height,
            fps,
            frame_count,
            filter: None,
        })
    }
}

impl MediaBackend for FfmpegBackend {
    fn open_clip(&self, path: &Path) -> Result<Box<dyn FrameSource>> {
        let descriptor = self.probe_clip(path)?;

        let mut child = Command::new("ffmpeg")
            .args(["-v", "error", "-i"])
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "pipe:1"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| VideoError::DecodeFailed {
                reason: format!("failed to spawn ffmpeg for {}: {}", path.display(), e),
            })?;

        let stdout = child.stdout.take().ok_or_else(|| VideoError::DecodeFailed {
            reason: "ffmpeg stdout unavailable".to_string(),
        })?;

        Ok(Box::new(FfmpegFrameReader {
            descriptor,
            child,
            stdout,
        }))
    }

    fn open_sink(&self, path: &Path, geometry: &ReferenceGeometry) -> Result<Box<dyn FrameSink>> {
        let size = format!("{}x{}", geometry.width, geometry.height);
        let rate = geometry.fps.to_string();

        let mut child = Command::new("ffmpeg")
            .args([
                "-v", "error", "-y", "-f", "rawvideo", "-pix_fmt", "rgb24", "-s", &size, "-r",
                &rate, "-i", "pipe:0", "-an", "-c:v", "mpeg4", "-q:v", "3",
            ])
            .arg(path)
            .stdin(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VideoError::EncodeFailed {
                reason: format!("failed to spawn ffmpeg encoder: {}", e),
            })?;

        let stdin = child.stdin.take().ok_or_else(|| VideoError::EncodeFailed {
            reason: "ffmpeg stdin unavailable".to_string(),
        })?;

        Ok(Box::new(FfmpegFrameWriter {
            child,
            stdin: Some(stdin),
            frames_written: 0,
        }))
    }

    fn mux(&self, video: &Path, audio: &Path, output: &Path) -> Result<()> {
        info!("Muxing {} + {} -> {}", video.display(), audio.display(), output.display());

        let result = Command::new("ffmpeg")
            .args(["-y", "-i"])
            .arg(video)
            .arg("-i")
            .arg(audio)
            .args(["-c:v", "libx264", "-preset", "ultrafast", "-c:a", "aac", "-shortest"])
            .arg(output)
            .output()
            .map_err(|e| VideoError::MuxFailed {
                reason: format!("ffmpeg execution failed: {}", e),
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(VideoError::MuxFailed {
                reason: format!("ffmpeg exited with {}: {}", result.status, stderr),
            }
            .into());
        }

        Ok(())
    }

    fn probe_duration(&self, path: &Path) -> Result<f64> {
        let output = Command::new("ffprobe")
            .args(["-v", "quiet", "-print_format", "json", "-show_format"])
            .arg(path)
            .output()
            .map_err(|_| VideoError::ProbeFailed {
                path: path.display().to_string(),
            })?;

        if !output.status.success() {
            return Err(VideoError::ProbeFailed {
                path: path.display().to_string(),
            }
            .into());
        }

        let json = String::from_utf8_lossy(&output.stdout);
        extract_json_number(&json, "duration").ok_or_else(|| {
            VideoError::ProbeFailed {
                path: format!("{}: no duration in ffprobe output", path.display()),
            }
            .into()
        })
    }
}

struct FfmpegFrameReader {
    descriptor: ClipDescriptor,
    child: Child,
    stdout: ChildStdout,
}

impl FrameSource for FfmpegFrameReader {
    fn descriptor(&self) -> &ClipDescriptor {
        &self.descriptor
    }

    fn read_frame(&mut self) -> Result<Option<Frame>> {
        let frame_len = self.descriptor.width as usize * self.descriptor.height as usize * 3;
        let mut data = vec![0u8; frame_len];
        let mut filled = 0;

        while filled < frame_len {
            let n = self.stdout.read(&mut data[filled..]).map_err(|e| {
                VideoError::DecodeFailed {
                    reason: format!("pipe read failed: {}", e),
                }
            })?;

            if n == 0 {
                if filled == 0 {
                    return Ok(None); // Clean end of stream
                }
                return Err(VideoError::DecodeFailed {
                    reason: format!(
                        "truncated frame from {} ({} of {} bytes)",
                        self.descriptor.path.display(),
                        filled,
                        frame_len
                    ),
                }
                .into());
            }
            filled += n;
        }

        Frame::from_raw(self.descriptor.width, self.descriptor.height, data)
            .map(Some)
            .ok_or_else(|| {
                VideoError::DecodeFailed {
                    reason: "frame buffer size mismatch".to_string(),
                }
                .into()
            })
    }
}

impl Drop for FfmpegFrameReader {
    fn drop(&mut self) {
        // Readers may be dropped mid-stream (short decode); reap the child
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

struct FfmpegFrameWriter {
    child: Child,
    stdin: Option<ChildStdin>,
    frames_written: u64,
}

impl FrameSink for FfmpegFrameWriter {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| VideoError::EncodeFailed {
            reason: "sink already finished".to_string(),
        })?;

        stdin.write_all(frame.as_raw()).map_err(|e| VideoError::EncodeFailed {
            reason: format!("pipe write failed after {} frames: {}", self.frames_written, e),
        })?;

        self.frames_written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Closing stdin signals end of stream to the encoder
        drop(self.stdin.take());

        let status = self.child.wait()?;
        if !status.success() {
            let mut stderr = String::new();
            if let Some(pipe) = self.child.stderr.as_mut() {
                let _ = pipe.read_to_string(&mut stderr);
            }
            return Err(VideoError::EncodeFailed {
                reason: format!("ffmpeg encoder exited with {}: {}", status, stderr.trim()),
            }
            .into());
        }

        debug!("Encoded {} frames to intermediate stream", self.frames_written);
        Ok(())
    }
}

impl Drop for FfmpegFrameWriter {
    fn drop(&mut self) {
        if self.stdin.is_some() {
            warn!("Frame sink dropped without finish(), killing encoder");
            drop(self.stdin.take());
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Pull a numeric field out of ffprobe's JSON without a full parser
///
/// Handles both bare numbers and ffprobe's quoted numeric strings
/// (`"nb_frames": "150"`).
fn extract_json_number(json: &str, key: &str) -> Option<f64> {
    let pattern = format!("\"{}\":", key);
    let start = json.find(&pattern)? + pattern.len();
    let remaining = json[start..].trim_start().trim_start_matches('"');
    let end = remaining
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
        .unwrap_or(remaining.len());
    remaining[..end].parse().ok()
}

/// Parse `"avg_frame_rate": "30000/1001"` style rational frame rates
fn extract_fps(json: &str) -> Option<f64> {
    let pattern = "\"avg_frame_rate\":";
    let start = json.find(pattern)? + pattern.len();
    let remaining = json[start..].trim_start().trim_start_matches('"');
    let end = remaining.find('"')?;
    let rate = &remaining[..end];

    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    if den != 0.0 && num > 0.0 {
        Some(num / den)
    } else {
        None
    }
}
