use crate::telemetry::value_or_zero;

use super::{Finding, ProblemRule, SampleWindow, Severity};

const MIN_BRAKE_PCT: f64 = 0.2;
const MIN_THROTTLE_PCT: f64 = 0.5;

/// Flags samples where the driver is on both pedals.
pub(crate) struct ThrottleBrakeOverlapRule;

impl ProblemRule for ThrottleBrakeOverlapRule {
    fn name(&self) -> &'static str {
        "throttle/brake overlap"
    }

    fn check(&self, window: &SampleWindow) -> Option<Finding> {
        let brake = value_or_zero(window.current.brake);
        let throttle = value_or_zero(window.current.throttle);

        (brake > MIN_BRAKE_PCT && throttle > MIN_THROTTLE_PCT).then_some(Finding {
            description: "overlapping throttle and brake",
            severity: Severity::Medium,
        })
    }
}
