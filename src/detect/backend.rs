use anyhow::Result;

use crate::detect::result::DetectionResult;

/// Detector backend trait.
///
/// Backends receive packed RGB24 pixels for the duration of one call and
/// return bounding boxes. They must not keep the pixel slice.
pub trait DetectorBackend: Send {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult>;

    /// Optional warm-up hook.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}
