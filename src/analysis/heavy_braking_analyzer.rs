use crate::telemetry::value_or_zero;

use super::{Finding, ProblemRule, SampleWindow, Severity};

/// Brake pressure above which a stop counts as heavy
const MIN_BRAKE_PCT: f64 = 0.8;
/// Speed lost since the previous sample
const MIN_SPEED_DROP: f64 = 20.;

pub(crate) struct HeavyBrakingRule;

impl ProblemRule for HeavyBrakingRule {
    fn name(&self) -> &'static str {
        "heavy braking"
    }

    fn check(&self, window: &SampleWindow) -> Option<Finding> {
        let brake = value_or_zero(window.current.brake);
        let speed_drop = value_or_zero(window.prev.speed) - value_or_zero(window.current.speed);

        (brake > MIN_BRAKE_PCT && speed_drop > MIN_SPEED_DROP).then_some(Finding {
            description: "heavy braking",
            severity: Severity::High,
        })
    }
}
