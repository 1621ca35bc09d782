//! Synthetic scene source.
//!
//! Renders a dark room and, while the script says someone is present, a
//! white block standing in for the occupant. Pairs with `StubBackend`.

use anyhow::Result;

use super::FrameSource;
use crate::frame::Frame;

/// Configuration for a synthetic scene.
#[derive(Clone, Debug)]
pub struct SyntheticConfig {
    /// Scene name from the `stub://` URL. `empty` never shows an occupant.
    pub scene: String,
    pub width: u32,
    pub height: u32,
    /// Frames with an occupant at the start of each cycle.
    pub present_frames: u64,
    /// Frames without one for the rest of the cycle.
    pub absent_frames: u64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            scene: "room".to_string(),
            width: 640,
            height: 480,
            present_frames: 30,
            absent_frames: 90,
        }
    }
}

/// Synthetic frame source.
pub struct SyntheticSource {
    config: SyntheticConfig,
    /// Explicit per-frame presence; the source ends once it is exhausted.
    script: Option<Vec<bool>>,
    frame_count: u64,
}

impl SyntheticSource {
    /// Endless cycling scene.
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            script: None,
            frame_count: 0,
        }
    }

    /// Finite scene following `script`, one entry per frame.
    pub fn scripted(config: SyntheticConfig, script: Vec<bool>) -> Self {
        Self {
            config,
            script: Some(script),
            frame_count: 0,
        }
    }

    fn occupant_present(&self, index: u64) -> Option<bool> {
        if let Some(script) = &self.script {
            return script.get(index as usize).copied();
        }
        if self.config.scene == "empty" {
            return Some(false);
        }
        let cycle = self.config.present_frames + self.config.absent_frames;
        if cycle == 0 {
            return Some(false);
        }
        Some(index % cycle < self.config.present_frames)
    }

    fn render(&self, present: bool) -> Vec<u8> {
        let (w, h) = (self.config.width as usize, self.config.height as usize);
        let shade = 30 + (self.frame_count % 8) as u8;
        let mut pixels = vec![shade; w * h * 3];
        if present {
            let (bw, bh) = (w / 5, h / 2);
            let (bx, by) = ((w - bw) / 2, h - bh);
            for y in by..by + bh {
                let row = (y * w + bx) * 3;
                pixels[row..row + bw * 3].fill(255);
            }
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn describe(&self) -> String {
        format!("stub://{}", self.config.scene)
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("SyntheticSource: connected to {}", self.describe());
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let Some(present) = self.occupant_present(self.frame_count) else {
            return Ok(None);
        };
        let pixels = self.render(present);
        self.frame_count += 1;
        Frame::from_rgb(
            pixels,
            self.config.width,
            self.config.height,
            self.frame_count,
        )
        .map(Some)
    }

    fn frames_captured(&self) -> u64 {
        self.frame_count
    }
}
