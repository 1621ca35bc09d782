//! Frame ingestion sources.
//!
//! - Synthetic scenes (`stub://<name>`) for demos and tests
//! - Image directory replay (a local directory of JPEG/PNG files)
//! - USB/V4L2 devices (feature: ingest-v4l2)
//!
//! Every source yields packed RGB24 `Frame`s through [`FrameSource`].
//! `Ok(None)` means the stream ended normally; an error means capture failed.
//! The driver treats both as the end of the run.
//!
//! Sources MUST NOT store captured frames to disk or log pixel content.

pub mod dir;
#[cfg(feature = "ingest-v4l2")]
mod normalize;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use std::path::Path;

use anyhow::{anyhow, Result};

use crate::frame::Frame;

pub use dir::{DirConfig, DirSource};
pub use synthetic::{SyntheticConfig, SyntheticSource};
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::{V4l2Config, V4l2Source};

/// A stream of captured frames.
pub trait FrameSource {
    /// Human-readable source description for logs.
    fn describe(&self) -> String;

    /// Open the underlying device or stream.
    fn connect(&mut self) -> Result<()> {
        Ok(())
    }

    /// Capture the next frame. `Ok(None)` marks end of stream.
    fn next_frame(&mut self) -> Result<Option<Frame>>;

    /// Frames captured so far.
    fn frames_captured(&self) -> u64;
}

/// Source location and capture parameters.
#[derive(Clone, Debug)]
pub struct SourceSettings {
    pub url: String,
    pub target_fps: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            url: "stub://room".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

/// Pick a source implementation from the URL.
///
/// `stub://` selects the synthetic scene, `/dev/` paths select V4L2 and any
/// other local directory is replayed as a sequence of still images.
pub fn open_source(settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    let url = settings.url.trim();
    if url.is_empty() {
        return Err(anyhow!("source url must not be empty"));
    }
    if let Some(scene) = url.strip_prefix("stub://") {
        return Ok(Box::new(SyntheticSource::new(SyntheticConfig {
            scene: scene.to_string(),
            width: settings.width,
            height: settings.height,
            ..SyntheticConfig::default()
        })));
    }
    if url.contains("://") {
        return Err(anyhow!(
            "unsupported source '{}' (local paths and stub:// only)",
            url
        ));
    }
    if url.starts_with("/dev/") {
        return open_device(url, settings);
    }
    Ok(Box::new(DirSource::new(DirConfig {
        dir: Path::new(url).to_path_buf(),
    })?))
}

#[cfg(feature = "ingest-v4l2")]
fn open_device(url: &str, settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    Ok(Box::new(V4l2Source::new(V4l2Config {
        device: url.to_string(),
        target_fps: settings.target_fps,
        width: settings.width,
        height: settings.height,
    })))
}

#[cfg(not(feature = "ingest-v4l2"))]
fn open_device(url: &str, _settings: &SourceSettings) -> Result<Box<dyn FrameSource>> {
    Err(anyhow!("capture from {} requires the ingest-v4l2 feature", url))
}
