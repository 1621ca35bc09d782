use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult, ObjectClass};
use crate::frame::rgb_len;

/// Channel value at or above which a pixel counts as lit.
const BRIGHT_LEVEL: u8 = 230;

/// Minimum share of lit pixels before a blob is reported.
const MIN_COVERAGE: f32 = 0.01;

/// Stub backend for testing and the synthetic source.
///
/// Reports the bounding box of all near-white pixels as a single person when
/// they cover enough of the frame. The synthetic source draws its "occupant"
/// as a white block, so the two pair up without a model.
#[derive(Default)]
pub struct StubBackend;

impl StubBackend {
    pub fn new() -> Self {
        Self
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let expected = rgb_len(width, height)?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected,
                pixels.len()
            ));
        }
        if expected == 0 {
            return Ok(DetectionResult::default());
        }

        let w = width as usize;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (usize::MAX, usize::MAX, 0, 0);
        let mut lit = 0usize;
        for (i, px) in pixels.chunks_exact(3).enumerate() {
            if px.iter().all(|&c| c >= BRIGHT_LEVEL) {
                let (x, y) = (i % w, i / w);
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
                lit += 1;
            }
        }

        let total = (width as usize * height as usize) as f32;
        let coverage = lit as f32 / total;
        if lit == 0 || coverage < MIN_COVERAGE {
            return Ok(DetectionResult::default());
        }

        let (fw, fh) = (width as f32, height as f32);
        Ok(DetectionResult {
            detections: vec![Detection {
                x: min_x as f32 / fw,
                y: min_y as f32 / fh,
                w: (max_x - min_x + 1) as f32 / fw,
                h: (max_y - min_y + 1) as f32 / fh,
                confidence: (0.5 + coverage * 4.0).min(0.95),
                class: ObjectClass::Person,
            }],
        })
    }
}
