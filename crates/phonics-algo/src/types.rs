use serde::{Deserialize, Serialize};

/// Lower bound for the SM-2 ease factor.
pub const EASE_FLOOR: f64 = 1.3;

/// Starting ease factor for an item never practiced before.
pub const INITIAL_EASE: f64 = 2.5;

/// Recall quality for one completed practice episode, on the SM-2 scale.
///
/// 0..=2 count as failures, 3..=5 as successes of increasing quality.
/// The mapping from episode outcome to quality lives with the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.min(5))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn is_success(&self) -> bool {
        self.0 >= 3
    }
}

impl From<u8> for Quality {
    fn from(value: u8) -> Self {
        Self::new(value)
    }
}

/// Scheduling state for one learner x item pair.
///
/// `interval_days` is the gap to the next review; the caller derives the
/// absolute due timestamp from it. `repetitions` counts consecutive
/// successful reviews and resets on failure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleState {
    pub ease_factor: f64,
    pub interval_days: i64,
    pub repetitions: i32,
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self {
            ease_factor: INITIAL_EASE,
            interval_days: 0,
            repetitions: 0,
        }
    }
}

impl ScheduleState {
    pub fn is_new(&self) -> bool {
        self.repetitions == 0 && self.interval_days == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_clamps_to_five() {
        assert_eq!(Quality::new(9).value(), 5);
        assert_eq!(Quality::new(3).value(), 3);
    }

    #[test]
    fn test_quality_success_threshold() {
        assert!(!Quality::new(2).is_success());
        assert!(Quality::new(3).is_success());
    }

    #[test]
    fn test_default_state_is_new() {
        assert!(ScheduleState::default().is_new());
        assert_eq!(ScheduleState::default().ease_factor, INITIAL_EASE);
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let json = serde_json::to_string(&ScheduleState::default()).unwrap();
        assert!(json.contains("\"easeFactor\":2.5"));
        assert!(json.contains("\"intervalDays\":0"));
        let back: ScheduleState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ScheduleState::default());
    }
}
