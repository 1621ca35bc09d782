#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{Detection, DetectionResult, ObjectClass};
use crate::frame::rgb_len;

/// Candidates below this score are dropped before suppression.
const SCORE_FLOOR: f32 = 0.25;
const NMS_IOU: f32 = 0.45;

/// Tract-based backend for YOLOv8 ONNX exports.
///
/// Expects a single `[1, 4 + classes, anchors]` output with boxes in input
/// pixel units (`cx, cy, w, h`) followed by per-class scores in COCO order.
/// Frames are stretched to the square model input, so normalized box
/// coordinates map straight back onto the original frame.
pub struct TractBackend {
    model: SimplePlan<TypedFact, Box<dyn TypedOp>>,
    input_size: u32,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let model_path = model_path.as_ref();
        let side = input_size as usize;
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, side, side)))
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self { model, input_size })
    }

    fn build_input(&self, pixels: &[u8], width: u32, height: u32) -> Result<Tensor> {
        let expected = rgb_len(width, height)?;
        if pixels.len() != expected {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected,
                pixels.len()
            ));
        }

        let image = RgbImage::from_raw(width, height, pixels.to_vec())
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", width, height))?;
        let side = self.input_size;
        let resized = if width == side && height == side {
            image
        } else {
            imageops::resize(&image, side, side, FilterType::Triangle)
        };

        let input = tract_ndarray::Array4::from_shape_fn(
            (1, 3, side as usize, side as usize),
            |(_, channel, y, x)| resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0,
        );
        Ok(input.into_tensor())
    }

    fn decode(&self, outputs: TVec<TValue>) -> Result<Vec<Detection>> {
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?;
        let view = view
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("YOLO output must be rank 3")?;
        let (batch, rows, _) = view.dim();
        if batch != 1 || rows <= 4 {
            return Err(anyhow!("unexpected YOLO output shape {:?}", view.shape()));
        }
        Ok(suppress(candidates(view, self.input_size as f32)))
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, pixels: &[u8], width: u32, height: u32) -> Result<DetectionResult> {
        let input = self.build_input(pixels, width, height)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let detections = self.decode(outputs)?;
        log::trace!("tract: {} detections after suppression", detections.len());
        Ok(DetectionResult { detections })
    }

    fn warm_up(&mut self) -> Result<()> {
        let side = self.input_size;
        let blank = vec![0u8; rgb_len(side, side)?];
        self.detect(&blank, side, side).map(|_| ())
    }
}

/// Walk a `[1, 4 + classes, anchors]` output, keeping each anchor's best class
/// when it clears `SCORE_FLOOR`. Boxes are normalized by the model input side.
fn candidates(view: tract_ndarray::ArrayView3<f32>, side: f32) -> Vec<Detection> {
    let (_, rows, anchors) = view.dim();
    let mut out = Vec::new();
    for i in 0..anchors {
        let (class_idx, score) = (4..rows)
            .map(|r| (r - 4, view[[0, r, i]]))
            .fold((0usize, f32::NEG_INFINITY), |best, cur| {
                if cur.1 > best.1 {
                    cur
                } else {
                    best
                }
            });
        if !score.is_finite() || score < SCORE_FLOOR {
            continue;
        }
        let (cx, cy, w, h) = (
            view[[0, 0, i]],
            view[[0, 1, i]],
            view[[0, 2, i]],
            view[[0, 3, i]],
        );
        out.push(Detection {
            x: ((cx - w / 2.0) / side).clamp(0.0, 1.0),
            y: ((cy - h / 2.0) / side).clamp(0.0, 1.0),
            w: (w / side).clamp(0.0, 1.0),
            h: (h / side).clamp(0.0, 1.0),
            confidence: score,
            class: ObjectClass::from_coco(class_idx),
        });
    }
    out
}

/// Greedy per-class non-maximum suppression.
fn suppress(mut candidates: Vec<Detection>) -> Vec<Detection> {
    candidates.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::new();
    for cand in candidates {
        let overlaps = kept
            .iter()
            .any(|k| k.class == cand.class && iou(k, &cand) > NMS_IOU);
        if !overlaps {
            kept.push(cand);
        }
    }
    kept
}

fn iou(a: &Detection, b: &Detection) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.w).min(b.x + b.w);
    let y2 = (a.y + a.h).min(b.y + b.h);
    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.w * a.h + b.w * b.h - inter;
    if union <= 0.0 {
        0.0
    } else {
        inter / union
    }
}
