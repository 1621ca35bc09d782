//! Image directory replay source.
//!
//! Replays the JPEG/PNG files of a local directory in lexical order, one
//! frame per file. Useful for re-running a recorded session without a camera.
//! The stream ends after the last file.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use super::FrameSource;
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Configuration for a directory source.
#[derive(Clone, Debug)]
pub struct DirConfig {
    pub dir: PathBuf,
}

/// Directory replay source.
pub struct DirSource {
    config: DirConfig,
    files: Vec<PathBuf>,
    next_index: usize,
}

impl DirSource {
    pub fn new(config: DirConfig) -> Result<Self> {
        if !config.dir.is_dir() {
            return Err(anyhow!(
                "frame directory {} does not exist",
                config.dir.display()
            ));
        }
        Ok(Self {
            config,
            files: Vec::new(),
            next_index: 0,
        })
    }
}

impl FrameSource for DirSource {
    fn describe(&self) -> String {
        self.config.dir.display().to_string()
    }

    fn connect(&mut self) -> Result<()> {
        let entries = std::fs::read_dir(&self.config.dir)
            .with_context(|| format!("list frame directory {}", self.config.dir.display()))?;
        let mut files = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));
            if is_image && path.is_file() {
                files.push(path);
            }
        }
        files.sort();
        log::info!(
            "DirSource: {} frames queued from {}",
            files.len(),
            self.config.dir.display()
        );
        self.files = files;
        self.next_index = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(path) = self.files.get(self.next_index) else {
            return Ok(None);
        };
        let image = image::open(path)
            .with_context(|| format!("decode frame {}", path.display()))?
            .to_rgb8();
        self.next_index += 1;
        let (width, height) = image.dimensions();
        Frame::from_rgb(image.into_raw(), width, height, self.next_index as u64).map(Some)
    }

    fn frames_captured(&self) -> u64 {
        self.next_index as u64
    }
}
