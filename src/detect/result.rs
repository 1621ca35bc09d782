use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Error};

/// Result of running detection on a frame.
#[derive(Clone, Debug, Default)]
pub struct DetectionResult {
    /// Bounding boxes (normalized 0..1 coordinates, top-left origin).
    pub detections: Vec<Detection>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub confidence: f32,
    pub class: ObjectClass,
}

#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    Person,
    Vehicle,
    Animal,
    Unknown,
}

impl ObjectClass {
    /// Map a COCO-80 class index (YOLO ordering) onto a coarse class.
    pub fn from_coco(index: usize) -> Self {
        match index {
            0 => ObjectClass::Person,
            1..=8 => ObjectClass::Vehicle,
            14..=23 => ObjectClass::Animal,
            _ => ObjectClass::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectClass::Person => "person",
            ObjectClass::Vehicle => "vehicle",
            ObjectClass::Animal => "animal",
            ObjectClass::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObjectClass {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "person" => Ok(ObjectClass::Person),
            "vehicle" => Ok(ObjectClass::Vehicle),
            "animal" => Ok(ObjectClass::Animal),
            other => Err(anyhow!("unknown target class '{}'", other)),
        }
    }
}
