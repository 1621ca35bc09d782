//! Display collaborators.
//!
//! The driver builds a [`StatusView`] every frame and hands it to each
//! configured [`Display`]. `StatusLine` mirrors the overlay text on the
//! terminal and `SnapshotDisplay` keeps an image file showing the room.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget};

use crate::assets::RoomAssets;
use crate::ui::{spinner_style, Ui};

/// What the room display shows for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusView {
    pub light_on: bool,
    /// Whole seconds until the light turns off, while counting down.
    pub countdown_secs: Option<u64>,
    /// Qualifying detections in this frame.
    pub subjects: usize,
}

impl StatusView {
    pub fn status_text(&self) -> &'static str {
        if self.light_on {
            "STATUS: LIGHTS ON"
        } else {
            "STATUS: LIGHTS OFF"
        }
    }

    pub fn countdown_text(&self) -> Option<String> {
        self.countdown_secs.map(|secs| format!("Closing in {secs}s"))
    }

    /// Status and countdown on one line.
    pub fn overlay_line(&self) -> String {
        match self.countdown_text() {
            Some(countdown) => format!("{}  {}", self.status_text(), countdown),
            None => self.status_text().to_string(),
        }
    }
}

pub trait Display {
    fn render(&mut self, view: &StatusView) -> Result<()>;

    /// Called once when the run ends.
    fn finish(&mut self) {}
}

/// Terminal status line: a spinner on a TTY, otherwise a line per change.
pub struct StatusLine {
    spinner: Option<ProgressBar>,
    last_line: Option<String>,
}

impl StatusLine {
    pub fn new(ui: &Ui) -> Self {
        let spinner = ui.use_pretty().then(|| {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.set_style(spinner_style());
            spinner
        });
        Self {
            spinner,
            last_line: None,
        }
    }
}

impl Display for StatusLine {
    fn render(&mut self, view: &StatusView) -> Result<()> {
        let mut line = view.overlay_line();
        if view.subjects > 0 {
            line.push_str(&format!("  ({} in view)", view.subjects));
        }
        if self.last_line.as_deref() == Some(line.as_str()) {
            if let Some(spinner) = &self.spinner {
                spinner.tick();
            }
            return Ok(());
        }
        match &self.spinner {
            Some(spinner) => spinner.set_message(line.clone()),
            None => eprintln!("{line}"),
        }
        self.last_line = Some(line);
        Ok(())
    }

    fn finish(&mut self) {
        if let Some(spinner) = &self.spinner {
            spinner.finish();
        }
    }
}

/// Writes the ON or OFF room image to a file whenever the light changes.
pub struct SnapshotDisplay {
    assets: RoomAssets,
    path: PathBuf,
    shown: Option<bool>,
}

impl SnapshotDisplay {
    pub fn new(assets: RoomAssets, path: impl AsRef<Path>) -> Self {
        Self {
            assets,
            path: path.as_ref().to_path_buf(),
            shown: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, light_on: bool) -> Result<()> {
        // Write beside the target and rename so viewers never see a partial file.
        let ext = self
            .path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("png");
        let tmp = self.path.with_extension(format!("partial.{ext}"));
        self.assets
            .image_for(light_on)
            .save(&tmp)
            .with_context(|| format!("write room snapshot {}", tmp.display()))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("replace room snapshot {}", self.path.display()))
    }
}

impl Display for SnapshotDisplay {
    fn render(&mut self, view: &StatusView) -> Result<()> {
        if self.shown == Some(view.light_on) {
            return Ok(());
        }
        self.write(view.light_on)?;
        log::debug!(
            "room snapshot {} now shows lights {}",
            self.path.display(),
            if view.light_on { "on" } else { "off" }
        );
        self.shown = Some(view.light_on);
        Ok(())
    }
}
