use std::fs::File;
use std::path::Path;

use symphonia::core::audio::{AudioBufferRef, Signal};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{AudioError, Result};

/// Decoded PCM with metadata
#[derive(Debug, Clone)]
pub struct AudioData {
    /// Samples in [-1, 1] (interleaved for stereo, mono for single channel)
    pub samples: Vec<f32>,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Duration in seconds
    pub duration: f64,
}

impl AudioData {
    /// Get a mono mix of all channels
    pub fn mono_samples(&self) -> Vec<f32> {
        if self.channels == 1 {
            return self.samples.clone();
        }

        let mut mono = Vec::with_capacity(self.samples.len() / self.channels as usize);

        for chunk in self.samples.chunks(self.channels as usize) {
            let sum: f32 = chunk.iter().sum();
            mono.push(sum / self.channels as f32);
        }

        mono
    }
}

/// Audio file loader supporting multiple formats
pub struct AudioLoader;

impl AudioLoader {
    /// Load an audio file and return raw PCM
    ///
    /// Integer formats are scaled by the format's maximum magnitude; float
    /// formats are normalized by their own peak absolute value.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_lowercase();

        match extension.as_str() {
            "wav" => Self::load_wav(path).await,
            "mp3" | "flac" | "ogg" | "m4a" | "aac" => Self::load_with_symphonia(path).await,
            _ => Err(AudioError::UnsupportedFormat { format: extension }.into()),
        }
    }

    /// Load WAV files using the hound crate (most reliable for WAV)
    async fn load_wav<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();

        let reader = hound::WavReader::open(path).map_err(|_| AudioError::DecodeFailed {
            path: path.display().to_string(),
        })?;

        let spec = reader.spec();
        let sample_rate = spec.sample_rate;
        let channels = spec.channels;

        let samples: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                let raw: std::result::Result<Vec<f32>, _> = reader.into_samples::<f32>().collect();
                let raw = raw.map_err(|_| AudioError::DecodeFailed {
                    path: path.display().to_string(),
                })?;
                Self::normalize_by_peak(raw)
            }
            hound::SampleFormat::Int => {
                let bit_depth = spec.bits_per_sample;
                let raw: std::result::Result<Vec<i32>, _> = reader.into_samples().collect();

                raw.map_err(|_| AudioError::DecodeFailed {
                    path: path.display().to_string(),
                })?
                .into_iter()
                .map(|sample| Self::int_to_float(sample, bit_depth))
                .collect()
            }
        };

        let duration = samples.len() as f64 / (sample_rate as u64 * channels as u64) as f64;

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
        })
    }

    /// Load compressed formats using Symphonia
    async fn load_with_symphonia<P: AsRef<Path>>(path: P) -> Result<AudioData> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|_| AudioError::DecodeFailed {
            path: path.display().to_string(),
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(extension);
        }

        let meta_opts: MetadataOptions = Default::default();
        let fmt_opts: FormatOptions = Default::default();

        let probed = symphonia::default::get_probe()
            .format(&hint, mss, &fmt_opts, &meta_opts)
            .map_err(|_| AudioError::DecodeFailed {
                path: path.display().to_string(),
            })?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| AudioError::DecodeFailed {
                path: path.display().to_string(),
            })?;

        let track_id = track.id;
        let codec_params = &track.codec_params;

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No sample rate found".to_string(),
            })?;

        let channels = codec_params
            .channels
            .ok_or_else(|| AudioError::InvalidParameters {
                details: "No channel information found".to_string(),
            })?
            .count() as u16;

        let dec_opts: DecoderOptions = Default::default();
        let mut decoder = symphonia::default::get_codecs()
            .make(codec_params, &dec_opts)
            .map_err(|_| AudioError::DecodeFailed {
                path: path.display().to_string(),
            })?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(SymphoniaError::IoError(_)) => break, // End of stream
                Err(_) => break,
            };

            while !format.metadata().is_latest() {
                format.metadata().pop();
            }

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => Self::convert_audio_buffer_to_f32(&decoded, &mut samples),
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::DecodeError(_)) => continue,
                Err(_) => break,
            }
        }

        if samples.is_empty() {
            return Err(AudioError::DecodeFailed {
                path: path.display().to_string(),
            }
            .into());
        }

        let duration = samples.len() as f64 / (sample_rate as u64 * channels as u64) as f64;

        Ok(AudioData {
            samples,
            sample_rate,
            channels,
            duration,
        })
    }

    /// Convert an integer sample to float in [-1, 1] by the format maximum
    fn int_to_float(sample: i32, bit_depth: u16) -> f32 {
        match bit_depth {
            8 => (sample as f32 - 128.0) / 128.0,
            16 => sample as f32 / 32768.0,
            24 => sample as f32 / 8388608.0,
            32 => sample as f32 / 2147483648.0,
            _ => sample as f32 / 32768.0, // Default to 16-bit
        }
    }

    /// Scale float samples by their own peak magnitude
    fn normalize_by_peak(samples: Vec<f32>) -> Vec<f32> {
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
        if peak <= 0.0 {
            return samples;
        }
        samples.into_iter().map(|s| s / peak).collect()
    }

    /// Convert a Symphonia audio buffer to interleaved f32 samples
    fn convert_audio_buffer_to_f32(buffer: &AudioBufferRef, output: &mut Vec<f32>) {
        match buffer {
            AudioBufferRef::F32(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx]);
                    }
                }
            }
            AudioBufferRef::F64(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx] as f32);
                    }
                }
            }
            AudioBufferRef::S32(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx] as f32 / 2147483648.0);
                    }
                }
            }
            AudioBufferRef::S16(buf) => {
                let channels = buf.spec().channels.count();
                let frames = buf.frames();

                for frame_idx in 0..frames {
                    for ch in 0..channels {
                        output.push(buf.chan(ch)[frame_idx] as f32 / 32768.0);
                    }
                }
            }
            _ => {
                tracing::warn!("Unsupported audio buffer format, skipping packet");
            }
        }
    }

    /// Check if a file format is supported
    pub fn is_format_supported(extension: &str) -> bool {
        matches!(
            extension.to_lowercase().as_str(),
            "wav" | "mp3" | "flac" | "ogg" | "m4a" | "aac"
        )
    }
}
