//! Sway Player - plays back a pressure recording as COP analytics.
//!
//! Loads a frame file, then either exports every frame's heatmap, COP and
//! confidence ellipse as JSON, or plays the recording at the configured
//! cadence while reading `play` / `pause` / `replay` / `quit` from stdin.

use std::fs;
use std::io::{BufRead, BufWriter};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use crossbeam_channel::{unbounded, Sender};
use pressure_sway::{
    FrameOutput, FrameSeries, FrameSink, PlaybackCommand, SensorGeometry, Session, SwayConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Frame file encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DataFormat {
    /// Array of arrays of numbers
    Json,
    /// Header-less rows of comma-separated numbers
    Csv,
}

/// Play back pressure-sensor frames with COP trajectory and sway ellipse
#[derive(Parser, Debug)]
#[command(name = "sway-player")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Frame file (JSON or CSV)
    #[arg(value_name = "DATA")]
    data: PathBuf,

    /// Frame file format (inferred from the extension if omitted)
    #[arg(short, long, value_enum)]
    format: Option<DataFormat>,

    /// Sensor geometry JSON file: [[x, y], ...] (default: 16-sensor insole)
    #[arg(short, long)]
    geometry: Option<PathBuf>,

    /// Configuration JSON file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Milliseconds between frames (overrides config)
    #[arg(long)]
    cadence_ms: Option<u64>,

    /// Gaussian smoothing radius (overrides config)
    #[arg(long)]
    sigma: Option<f64>,

    /// Ellipse confidence level, e.g. 0.95 (overrides config)
    #[arg(long)]
    confidence: Option<f64>,

    /// Use only the first N frames of the recording
    #[arg(long, value_name = "N")]
    frames: Option<usize>,

    /// Write every frame's output to this JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = load_config(&cli)?;
    let geometry = match &cli.geometry {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading geometry {}", path.display()))?;
            serde_json::from_str::<SensorGeometry>(&text)
                .with_context(|| format!("parsing geometry {}", path.display()))?
        }
        None => SensorGeometry::insole16(),
    };
    let mut frames = load_frames(&cli.data, cli.format, &geometry)?;
    if let Some(limit) = cli.frames {
        frames = frames.limit(limit).context("applying --frames")?;
        info!(frames = frames.len(), "frame limit applied");
    }
    let session = Session::new(geometry, frames, config)?;

    match &cli.export {
        Some(path) => run_export(&session, path),
        None => run_interactive(&session),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<SwayConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            SwayConfig::from_json_str(&text)?
        }
        None => SwayConfig::default(),
    };

    if let Some(ms) = cli.cadence_ms {
        config = config.with_cadence(Duration::from_millis(ms));
    }
    if let Some(sigma) = cli.sigma {
        config = config.with_sigma(sigma);
    }
    if let Some(level) = cli.confidence {
        config = config.with_confidence_level(level)?;
    }
    config.validate()?;
    Ok(config)
}

fn load_frames(
    path: &Path,
    format: Option<DataFormat>,
    geometry: &SensorGeometry,
) -> anyhow::Result<FrameSeries> {
    let format = format.unwrap_or_else(|| {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => DataFormat::Csv,
            _ => DataFormat::Json,
        }
    });

    let frames = match format {
        DataFormat::Json => FrameSeries::from_json_file(path, geometry),
        DataFormat::Csv => FrameSeries::from_csv_file(path, geometry),
    }
    .with_context(|| format!("loading frames from {}", path.display()))?;

    info!(path = %path.display(), ?format, frames = frames.len(), "frames loaded");
    Ok(frames)
}

fn run_export(session: &Session, path: &Path) -> anyhow::Result<()> {
    let outputs = session.all_outputs()?;
    let file =
        fs::File::create(path).with_context(|| format!("creating {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), &outputs)?;
    info!(path = %path.display(), frames = outputs.len(), "export written");
    Ok(())
}

fn run_interactive(session: &Session) -> anyhow::Result<()> {
    let (tx, rx) = unbounded();
    thread::spawn(move || read_commands(&tx));

    info!("Playing... type play, pause, replay or quit");
    let mut sink = LogSink;
    let state = session.play(&rx, &mut sink)?;
    info!(frame = state.index + 1, "stopped");
    Ok(())
}

/// Forward stdin lines as playback commands until EOF or `quit`.
fn read_commands(tx: &Sender<PlaybackCommand>) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let command = match line.trim().to_ascii_lowercase().as_str() {
            "" => continue,
            "play" | "p" => PlaybackCommand::Play,
            "pause" | "s" => PlaybackCommand::Pause,
            "replay" | "r" => PlaybackCommand::Replay,
            "quit" | "q" | "exit" => PlaybackCommand::Quit,
            other => {
                warn!(input = other, "unknown command");
                continue;
            }
        };
        if tx.send(command).is_err() || command == PlaybackCommand::Quit {
            break;
        }
    }
}

/// Logs a one-line summary of each displayed frame.
struct LogSink;

impl FrameSink for LogSink {
    fn present(&mut self, output: &FrameOutput) {
        let cop = output
            .cop
            .coords()
            .map_or_else(|| "undefined".to_string(), |[x, y]| format!("({x:.2}, {y:.2})"));
        info!(
            frame = output.display_number,
            cop = %cop,
            peak = output.field.max_value(),
            ellipse_area = output.ellipse.area(),
            path_length = output.path_length,
            "frame"
        );
    }
}
