use thiserror::Error;

/// Main error type for the beat-montage library
#[derive(Error, Debug)]
pub enum MontageError {
    #[error("Input validation error: {0}")]
    Input(#[from] InputError),

    #[error("Audio processing error: {0}")]
    Audio(#[from] AudioError),

    #[error("Video processing error: {0}")]
    Video(#[from] VideoError),

    #[error("Filter processing error: {0}")]
    Filter(#[from] FilterError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Input validation errors — reported before any work is performed
#[derive(Error, Debug)]
pub enum InputError {
    #[error("Expected between {min} and {max} clips, got {count}")]
    ClipCount { count: usize, min: usize, max: usize },

    #[error("Input file not found: {path}")]
    FileNotFound { path: String },
}

/// Audio-specific errors
///
/// Decode failures on the music track are recovered locally by the synthetic
/// beat-grid fallback and never abort a montage job.
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("Failed to decode audio file: {path}")]
    DecodeFailed { path: String },

    #[error("Unsupported audio format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Invalid audio parameters: {details}")]
    InvalidParameters { details: String },
}

/// Video-specific errors — always fatal for the job
#[derive(Error, Debug)]
pub enum VideoError {
    #[error("Failed to probe video file: {path}")]
    ProbeFailed { path: String },

    #[error("Video decoding failed: {reason}")]
    DecodeFailed { reason: String },

    #[error("Video encoding failed: {reason}")]
    EncodeFailed { reason: String },

    #[error("Audio/video mux failed: {reason}")]
    MuxFailed { reason: String },

    #[error("Invalid video parameters: {details}")]
    InvalidParameters { details: String },
}

/// Filter-specific errors
#[derive(Error, Debug)]
pub enum FilterError {
    #[error("Filter application failed: {filter} - {reason}")]
    ApplyFailed { filter: String, reason: String },
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file: {path}")]
    ParseFailed { path: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Convenience type alias for Results using MontageError
pub type Result<T> = std::result::Result<T, MontageError>;

impl MontageError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Input(InputError::ClipCount { count, min, max }) => {
                format!("Please provide {} to {} clips (got {}).", min, max, count)
            }
            Self::Audio(AudioError::DecodeFailed { path }) => {
                format!("Could not decode audio file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Video(VideoError::ProbeFailed { path }) => {
                format!("Could not read video file '{}'. Please check the file exists and is a supported format.", path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_count_message() {
        let err: MontageError = InputError::ClipCount { count: 7, min: 3, max: 6 }.into();
        let msg = err.user_message();
        assert!(msg.contains("3 to 6"));
        assert!(msg.contains('7'));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MontageError = io.into();
        assert!(matches!(err, MontageError::Io(_)));
    }
}
