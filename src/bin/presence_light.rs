//! presence_light - virtual room light driven by a webcam
//!
//! This binary:
//! 1. Loads configuration (file, env, command line)
//! 2. Loads the ON/OFF room images and checks the model file (fatal if missing)
//! 3. Opens the frame source and detector backend
//! 4. Runs the debounced light loop until Ctrl-C, end of stream or capture failure

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use presence_light::assets::require_file;
use presence_light::config::secs_to_duration;
use presence_light::ui::Ui;
use presence_light::{
    build_backend, open_source, run, Chime, Collaborators, CommandChime, Display, Journal,
    PresenceConfig, PresenceFilter, RoomAssets, RoomState, RunLimits, SilentChime,
    SnapshotDisplay, StatusLine, SystemClock,
};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// JSON config file.
    #[arg(long, env = "PRESENCE_CONFIG")]
    config: Option<PathBuf>,
    /// Frame source: stub://<scene>, /dev/videoN, or a directory of images.
    #[arg(long)]
    source: Option<String>,
    /// Seconds without a person before the light turns off.
    #[arg(long)]
    off_delay: Option<f64>,
    /// Minimum detection confidence (exclusive).
    #[arg(long)]
    threshold: Option<f32>,
    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<u64>,
    /// Terminal output style: auto, plain or pretty.
    #[arg(long)]
    ui: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let ui = Ui::from_args(args.ui.as_deref(), std::io::stderr().is_terminal());

    let cfg = {
        let _stage = ui.stage("load configuration");
        let mut cfg = PresenceConfig::load_from(args.config.as_deref())?;
        if let Some(url) = args.source {
            cfg.source.url = url;
        }
        if let Some(secs) = args.off_delay {
            cfg.off_delay = secs_to_duration(secs)?;
        }
        if let Some(threshold) = args.threshold {
            cfg.detector.threshold = threshold;
        }
        cfg.validate()?;
        cfg
    };

    let assets = {
        let _stage = ui.stage("load room images");
        if cfg.detector.backend.needs_model() {
            require_file(&cfg.detector.model_path, "detector model")?;
        }
        RoomAssets::load(&cfg.assets)?
    };

    let mut detector = {
        let _stage = ui.stage("prepare detector");
        build_backend(
            cfg.detector.backend,
            &cfg.detector.model_path,
            cfg.detector.input_size,
        )?
    };

    let mut source = {
        let _stage = ui.stage("connect frame source");
        let mut source = open_source(&cfg.source)?;
        source.connect()?;
        source
    };

    let mut journal = Journal::open(&cfg.log_file)?;
    let mut chime: Box<dyn Chime> = match cfg.chime.clone() {
        Some(settings) => Box::new(CommandChime::new(settings)),
        None => Box::new(SilentChime),
    };

    let mut status = StatusLine::new(&ui);
    let mut snapshot = cfg
        .snapshot_path
        .as_ref()
        .map(|path| SnapshotDisplay::new(assets, path));
    let mut displays: Vec<&mut dyn Display> = vec![&mut status as &mut dyn Display];
    if let Some(snapshot) = snapshot.as_mut() {
        log::info!("room snapshot written to {}", snapshot.path().display());
        displays.push(snapshot);
    }

    let quit = Arc::new(AtomicBool::new(false));
    {
        let quit = quit.clone();
        ctrlc::set_handler(move || quit.store(true, Ordering::SeqCst))
            .context("error setting Ctrl-C handler")?;
    }

    // Only devices block on capture; synthetic and replayed frames are paced to target_fps.
    let frame_interval = (!cfg.source.url.starts_with("/dev/"))
        .then(|| Duration::from_secs_f64(1.0 / cfg.source.target_fps as f64));

    log::info!(
        "monitoring {} (off delay {:.1}s, {} > {:.2}); logging to {}",
        source.describe(),
        cfg.off_delay.as_secs_f64(),
        cfg.detector.target_class,
        cfg.detector.threshold,
        journal.path().display()
    );

    let clock = SystemClock;
    let summary = run(
        Collaborators {
            source: &mut *source,
            detector: &mut *detector,
            filter: PresenceFilter::new(cfg.detector.target_class, cfg.detector.threshold),
            clock: &clock,
            journal: &mut journal,
            chime: &mut *chime,
            displays,
        },
        RoomState::new(cfg.off_delay),
        RunLimits {
            max_frames: args.max_frames,
            frame_interval,
        },
        &quit,
    )?;

    if summary.frames == 0 {
        log::warn!("no frames were captured from {}", source.describe());
    }
    Ok(())
}
