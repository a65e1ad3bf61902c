use crate::telemetry::{gear_or_neutral, value_or_zero};

use super::{Finding, ProblemRule, SampleWindow, Severity};

/// Gears below this are considered too short for high speed
const MAX_LOW_GEAR: i32 = 3;
const MIN_SPEED: f64 = 180.;

pub(crate) struct LateShiftRule;

impl ProblemRule for LateShiftRule {
    fn name(&self) -> &'static str {
        "late shift"
    }

    fn check(&self, window: &SampleWindow) -> Option<Finding> {
        let gear = gear_or_neutral(window.current.gear);
        let speed = value_or_zero(window.current.speed);

        (gear < MAX_LOW_GEAR && speed > MIN_SPEED).then_some(Finding {
            description: "late gear shift",
            severity: Severity::Low,
        })
    }
}
