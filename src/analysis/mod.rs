pub(crate) mod heavy_braking_analyzer;
pub(crate) mod late_shift_analyzer;
pub(crate) mod throttle_brake_overlap_analyzer;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::telemetry::{Sample, problem_positions};

use heavy_braking_analyzer::HeavyBrakingRule;
use late_shift_analyzer::LateShiftRule;
use throttle_brake_overlap_analyzer::ThrottleBrakeOverlapRule;

/// Only every 10th sample is checked
pub const EVALUATION_STRIDE: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A detected driving mistake placed in percent space on the track map.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProblemPoint {
    pub position: (f64, f64),
    pub description: String,
    pub severity: Severity,
}

/// What a rule reports when it fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Finding {
    pub description: &'static str,
    pub severity: Severity,
}

/// The evaluated sample and its direct neighbours.
#[derive(Clone, Copy, Debug)]
pub struct SampleWindow<'a> {
    pub index: usize,
    pub prev: &'a Sample,
    pub current: &'a Sample,
    pub next: &'a Sample,
}

pub trait ProblemRule {
    fn name(&self) -> &'static str;

    fn check(&self, window: &SampleWindow) -> Option<Finding>;
}

/// Indices the detector looks at: multiples of the stride, excluding the
/// first and last sample.
pub fn evaluated_indices(len: usize) -> impl Iterator<Item = usize> {
    (EVALUATION_STRIDE..len.saturating_sub(1)).step_by(EVALUATION_STRIDE)
}

pub struct AnomalyDetector {
    rules: Vec<Box<dyn ProblemRule>>,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            // rules fire independently, in this order
            rules: vec![
                Box::new(HeavyBrakingRule),
                Box::new(ThrottleBrakeOverlapRule),
                Box::new(LateShiftRule),
            ],
        }
    }
}

impl AnomalyDetector {
    pub fn with_rules(rules: Vec<Box<dyn ProblemRule>>) -> Self {
        Self { rules }
    }

    /// Scans the full sample sequence and returns problems in sample order.
    /// A sample may produce several problems, one per rule that fires.
    pub fn detect(&self, samples: &[Sample]) -> Vec<ProblemPoint> {
        let positions = problem_positions(samples);
        let mut problems = Vec::new();
        for index in evaluated_indices(samples.len()) {
            let window = SampleWindow {
                index,
                prev: &samples[index - 1],
                current: &samples[index],
                next: &samples[index + 1],
            };
            for rule in &self.rules {
                if let Some(finding) = rule.check(&window) {
                    debug!("{} fired at sample {}", rule.name(), index);
                    problems.push(ProblemPoint {
                        position: positions[index],
                        description: finding.description.to_string(),
                        severity: finding.severity,
                    });
                }
            }
        }
        debug!(
            "Detected {} problems in {} samples",
            problems.len(),
            samples.len()
        );
        problems
    }
}

/// Runs the default rule set.
pub fn detect_problems(samples: &[Sample]) -> Vec<ProblemPoint> {
    AnomalyDetector::default().detect(samples)
}
