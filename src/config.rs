use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::assets::AssetSettings;
use crate::chime::ChimeSettings;
use crate::detect::{BackendKind, ObjectClass, DEFAULT_THRESHOLD};
use crate::ingest::SourceSettings;

const DEFAULT_SOURCE_URL: &str = "stub://room";
const DEFAULT_FPS: u32 = 10;
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const DEFAULT_BACKEND: &str = "stub";
const DEFAULT_MODEL_PATH: &str = "yolov8n.onnx";
const DEFAULT_INPUT_SIZE: u32 = 640;
const DEFAULT_TARGET_CLASS: &str = "person";
const DEFAULT_OFF_DELAY_SECS: f64 = 5.0;
const DEFAULT_ASSETS_DIR: &str = ".";
const DEFAULT_ON_IMAGE: &str = "office_on.jpg";
const DEFAULT_OFF_IMAGE: &str = "office_off.png";
const DEFAULT_DISPLAY_WIDTH: u32 = 800;
const DEFAULT_DISPLAY_HEIGHT: u32 = 500;
const DEFAULT_LOG_FILE: &str = "room_log.txt";

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct PresenceConfigFile {
    source: Option<SourceConfigFile>,
    detector: Option<DetectorConfigFile>,
    debounce: Option<DebounceConfigFile>,
    assets: Option<AssetsConfigFile>,
    log_file: Option<PathBuf>,
    chime: Option<ChimeConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct SourceConfigFile {
    url: Option<String>,
    target_fps: Option<u32>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DetectorConfigFile {
    backend: Option<String>,
    model_path: Option<PathBuf>,
    input_size: Option<u32>,
    target_class: Option<String>,
    threshold: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DebounceConfigFile {
    off_delay_secs: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct AssetsConfigFile {
    dir: Option<PathBuf>,
    on_image: Option<PathBuf>,
    off_image: Option<PathBuf>,
    display_width: Option<u32>,
    display_height: Option<u32>,
    snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ChimeConfigFile {
    program: String,
    on_sound: PathBuf,
    off_sound: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub source: SourceSettings,
    pub detector: DetectorSettings,
    pub off_delay: Duration,
    /// Base directory for relative image, model, sound and log paths.
    pub assets_dir: PathBuf,
    pub assets: AssetSettings,
    pub snapshot_path: Option<PathBuf>,
    pub log_file: PathBuf,
    pub chime: Option<ChimeSettings>,
}

#[derive(Debug, Clone)]
pub struct DetectorSettings {
    pub backend: BackendKind,
    pub model_path: PathBuf,
    pub input_size: u32,
    pub target_class: ObjectClass,
    pub threshold: f32,
}

impl PresenceConfig {
    /// Load from the file named by `PRESENCE_CONFIG` (if set) plus env overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("PRESENCE_CONFIG")
            .ok()
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);
        Self::load_from(config_path.as_deref())
    }

    /// Load from an explicit file (or defaults), then apply env overrides.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let file_cfg = match path {
            Some(path) => read_config_file(path)?,
            None => PresenceConfigFile::default(),
        };
        let mut cfg = Self::from_file(file_cfg)?;
        cfg.apply_env()?;
        cfg.resolve_paths();
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: PresenceConfigFile) -> Result<Self> {
        let source_file = file.source.unwrap_or_default();
        let source = SourceSettings {
            url: source_file
                .url
                .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            target_fps: source_file.target_fps.unwrap_or(DEFAULT_FPS),
            width: source_file.width.unwrap_or(DEFAULT_WIDTH),
            height: source_file.height.unwrap_or(DEFAULT_HEIGHT),
        };

        let detector_file = file.detector.unwrap_or_default();
        let detector = DetectorSettings {
            backend: detector_file
                .backend
                .as_deref()
                .unwrap_or(DEFAULT_BACKEND)
                .parse()?,
            model_path: detector_file
                .model_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            input_size: detector_file.input_size.unwrap_or(DEFAULT_INPUT_SIZE),
            target_class: detector_file
                .target_class
                .as_deref()
                .unwrap_or(DEFAULT_TARGET_CLASS)
                .parse()?,
            threshold: detector_file.threshold.unwrap_or(DEFAULT_THRESHOLD),
        };

        let off_delay = secs_to_duration(
            file.debounce
                .and_then(|debounce| debounce.off_delay_secs)
                .unwrap_or(DEFAULT_OFF_DELAY_SECS),
        )?;

        let assets_file = file.assets.unwrap_or_default();
        let assets = AssetSettings {
            on_image: assets_file
                .on_image
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ON_IMAGE)),
            off_image: assets_file
                .off_image
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OFF_IMAGE)),
            display_width: assets_file.display_width.unwrap_or(DEFAULT_DISPLAY_WIDTH),
            display_height: assets_file
                .display_height
                .unwrap_or(DEFAULT_DISPLAY_HEIGHT),
        };

        let chime = file.chime.map(|chime| ChimeSettings {
            program: chime.program,
            on_sound: chime.on_sound,
            off_sound: chime.off_sound,
        });

        Ok(Self {
            source,
            detector,
            off_delay,
            assets_dir: assets_file
                .dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR)),
            assets,
            snapshot_path: assets_file.snapshot_path,
            log_file: file
                .log_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            chime,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("PRESENCE_SOURCE_URL") {
            if !url.trim().is_empty() {
                self.source.url = url;
            }
        }
        if let Ok(backend) = std::env::var("PRESENCE_BACKEND") {
            if !backend.trim().is_empty() {
                self.detector.backend = backend.parse()?;
            }
        }
        if let Ok(dir) = std::env::var("PRESENCE_ASSETS_DIR") {
            if !dir.trim().is_empty() {
                self.assets_dir = PathBuf::from(dir);
            }
        }
        if let Ok(path) = std::env::var("PRESENCE_LOG_FILE") {
            if !path.trim().is_empty() {
                self.log_file = PathBuf::from(path);
            }
        }
        if let Ok(delay) = std::env::var("PRESENCE_OFF_DELAY_SECS") {
            let secs: f64 = delay
                .trim()
                .parse()
                .map_err(|_| anyhow!("PRESENCE_OFF_DELAY_SECS must be a number of seconds"))?;
            self.off_delay = secs_to_duration(secs)?;
        }
        if let Ok(threshold) = std::env::var("PRESENCE_THRESHOLD") {
            self.detector.threshold = threshold
                .trim()
                .parse()
                .map_err(|_| anyhow!("PRESENCE_THRESHOLD must be a number between 0 and 1"))?;
        }
        Ok(())
    }

    /// Anchor relative file paths at `assets_dir`.
    fn resolve_paths(&mut self) {
        let dir = self.assets_dir.clone();
        for path in [
            &mut self.assets.on_image,
            &mut self.assets.off_image,
            &mut self.detector.model_path,
            &mut self.log_file,
        ] {
            *path = resolve(&dir, path);
        }
        if let Some(snapshot) = self.snapshot_path.as_mut() {
            *snapshot = resolve(&dir, snapshot);
        }
        if let Some(chime) = self.chime.as_mut() {
            chime.on_sound = resolve(&dir, &chime.on_sound);
            chime.off_sound = resolve(&dir, &chime.off_sound);
        }
    }

    /// Check ranges. Call again after applying command-line overrides.
    pub fn validate(&self) -> Result<()> {
        let threshold = self.detector.threshold;
        if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
            return Err(anyhow!(
                "detector threshold must be within 0..=1, got {}",
                threshold
            ));
        }
        if self.source.target_fps == 0 {
            return Err(anyhow!("source target_fps must be greater than zero"));
        }
        if self.source.width == 0 || self.source.height == 0 {
            return Err(anyhow!("source dimensions must be non-zero"));
        }
        if self.assets.display_width == 0 || self.assets.display_height == 0 {
            return Err(anyhow!("display dimensions must be non-zero"));
        }
        if self.detector.input_size == 0 {
            return Err(anyhow!("detector input_size must be non-zero"));
        }
        if self
            .chime
            .as_ref()
            .is_some_and(|chime| chime.program.trim().is_empty())
        {
            return Err(anyhow!("chime program must not be empty"));
        }
        Ok(())
    }
}

/// Convert a seconds value from config into a `Duration`.
pub fn secs_to_duration(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|_| anyhow!("off delay must be a finite, non-negative number of seconds"))
}

fn resolve(dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

fn read_config_file(path: &Path) -> Result<PresenceConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
