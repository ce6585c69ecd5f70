//! SM-2 spaced-repetition scheduling.
//!
//! One pure function from (previous state, recall quality) to the next
//! state. Failures reset the progression to a one-day interval without
//! rewarding the ease factor; successes walk the 1 / 3 / interval*ease
//! ladder. The ease factor is updated on every rated review and never
//! drops below [`EASE_FLOOR`].

use crate::types::{Quality, ScheduleState, EASE_FLOOR};

/// Compute the next scheduling state after a rated review.
///
/// Passing `None` treats the review as the first ever for this item and
/// starts from [`ScheduleState::default`].
pub fn update_schedule(current: Option<&ScheduleState>, quality: Quality) -> ScheduleState {
    let prev = current.copied().unwrap_or_default();
    let ease_factor = next_ease(prev.ease_factor, quality);

    if !quality.is_success() {
        return ScheduleState {
            ease_factor,
            interval_days: 1,
            repetitions: 0,
        };
    }

    let interval_days = match prev.repetitions {
        0 => 1,
        1 => 3,
        _ => (prev.interval_days as f64 * ease_factor).round() as i64,
    };

    ScheduleState {
        ease_factor,
        interval_days: interval_days.max(1),
        repetitions: prev.repetitions + 1,
    }
}

fn next_ease(ease: f64, quality: Quality) -> f64 {
    let q = quality.value() as f64;
    let updated = ease + (0.1 - (5.0 - q) * (0.08 + (5.0 - q) * 0.02));
    updated.max(EASE_FLOOR)
}
