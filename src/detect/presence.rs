use crate::detect::result::{DetectionResult, ObjectClass};

/// Default minimum confidence for a qualifying subject.
pub const DEFAULT_THRESHOLD: f32 = 0.4;

/// Reduces a detection result to "is a qualifying subject present".
///
/// A detection qualifies when its class matches `target` and its confidence
/// is strictly above `threshold`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PresenceFilter {
    pub target: ObjectClass,
    pub threshold: f32,
}

impl PresenceFilter {
    pub fn new(target: ObjectClass, threshold: f32) -> Self {
        Self { target, threshold }
    }

    pub fn qualifies(&self, result: &DetectionResult) -> bool {
        self.count(result) > 0
    }

    /// Number of qualifying detections.
    pub fn count(&self, result: &DetectionResult) -> usize {
        result
            .detections
            .iter()
            .filter(|d| d.class == self.target && d.confidence > self.threshold)
            .count()
    }
}

impl Default for PresenceFilter {
    fn default() -> Self {
        Self::new(ObjectClass::Person, DEFAULT_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::result::Detection;

    fn det(class: ObjectClass, confidence: f32) -> Detection {
        Detection {
            x: 0.1,
            y: 0.1,
            w: 0.2,
            h: 0.5,
            confidence,
            class,
        }
    }

    #[test]
    fn threshold_is_strict() {
        let filter = PresenceFilter::default();
        let at_threshold = DetectionResult {
            detections: vec![det(ObjectClass::Person, 0.4)],
        };
        assert!(!filter.qualifies(&at_threshold));

        let above = DetectionResult {
            detections: vec![det(ObjectClass::Person, 0.41)],
        };
        assert!(filter.qualifies(&above));
    }

    #[test]
    fn other_classes_never_qualify() {
        let filter = PresenceFilter::default();
        let result = DetectionResult {
            detections: vec![det(ObjectClass::Animal, 0.99), det(ObjectClass::Vehicle, 0.9)],
        };
        assert!(!filter.qualifies(&result));
        assert!(!filter.qualifies(&DetectionResult::default()));
    }

    #[test]
    fn counts_every_qualifying_box() {
        let filter = PresenceFilter::new(ObjectClass::Person, 0.5);
        let result = DetectionResult {
            detections: vec![
                det(ObjectClass::Person, 0.9),
                det(ObjectClass::Person, 0.3),
                det(ObjectClass::Person, 0.6),
            ],
        };
        assert_eq!(filter.count(&result), 2);
    }
}
