//! Captured frames.
//!
//! A `Frame` owns packed RGB24 pixels. Sources build frames, the driver hands
//! them to a detector backend and then drops them. Frames are never written
//! to disk.

use anyhow::{anyhow, Result};

use crate::detect::{DetectionResult, DetectorBackend};

/// One captured RGB24 frame.
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// 1-based capture counter assigned by the source.
    pub sequence: u64,
}

impl Frame {
    /// Wrap RGB24 pixels, checking the buffer matches the dimensions.
    pub fn from_rgb(data: Vec<u8>, width: u32, height: u32, sequence: u64) -> Result<Self> {
        let expected = rgb_len(width, height)?;
        if data.len() != expected {
            return Err(anyhow!(
                "RGB frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            sequence,
        })
    }

    /// Run a detector backend over this frame's pixels.
    pub fn run_detector(&self, backend: &mut dyn DetectorBackend) -> Result<DetectionResult> {
        backend.detect(&self.data, self.width, self.height)
    }

    pub fn pixels(&self) -> &[u8] {
        &self.data
    }
}

/// Byte length of a packed RGB24 buffer.
pub(crate) fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_buffer() {
        let err = Frame::from_rgb(vec![0u8; 10], 2, 2, 1).err().unwrap();
        assert!(err.to_string().contains("expected 12"));
    }

    #[test]
    fn accepts_exact_buffer() -> Result<()> {
        let frame = Frame::from_rgb(vec![7u8; 12], 2, 2, 3)?;
        assert_eq!(frame.pixels().len(), 12);
        assert_eq!(frame.sequence, 3);
        assert_eq!(frame.pixels()[0], 7);
        Ok(())
    }
}
