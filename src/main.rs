use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber;

use beat_montage::{
    config::Config,
    montage::MontageAssembler,
    video::FfmpegBackend,
};

#[derive(Parser)]
#[command(
    name = "beat-montage",
    version,
    about = "Cut video clips into a montage synchronized to a music track",
    long_about = "Beat-Montage extracts the beat grid from a music track and assembles intro, clips, and outro into one montage, cross-blending frames near every beat and rotating a color filter per clip."
)]
struct Cli {
    /// Music track (WAV, MP3, FLAC, OGG)
    #[arg(short, long)]
    music: PathBuf,

    /// Intro clip played before the user clips
    #[arg(short, long)]
    intro: PathBuf,

    /// Outro clip played after the user clips
    #[arg(short = 'O', long)]
    outro: PathBuf,

    /// User clip, in montage order (repeat 3 to 6 times)
    #[arg(short, long = "clip")]
    clips: Vec<PathBuf>,

    /// Output video file path
    #[arg(short, long)]
    output: PathBuf,

    /// Configuration file (optional)
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting Beat-Montage v{}", env!("CARGO_PKG_VERSION"));
    info!("Music: {:?}", cli.music);
    info!("Clips: {} + intro/outro", cli.clips.len());
    info!("Output: {:?}", cli.output);

    // Load configuration
    let config = match cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(&config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;

    let backend = FfmpegBackend::new()?;
    let assembler = MontageAssembler::new(config, Box::new(backend));

    info!("Starting montage assembly...");
    let duration = assembler
        .build_montage(&cli.clips, &cli.intro, &cli.outro, &cli.music, &cli.output)
        .await?;

    info!(
        "Montage complete! {:.2}s written to {:?}",
        duration, cli.output
    );
    Ok(())
}
