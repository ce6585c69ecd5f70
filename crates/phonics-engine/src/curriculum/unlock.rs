//! Pure progression logic over the curriculum table.
//!
//! Persistence-free by construction: callers load the learner's introduced
//! units and practiced keys, and write back whatever this module decides.

use std::collections::HashSet;

use super::{ContentItem, Curriculum};

/// Progression decisions for one learner position.
pub struct UnlockEngine<'a> {
    curriculum: &'a Curriculum,
}

impl<'a> UnlockEngine<'a> {
    pub fn new(curriculum: &'a Curriculum) -> Self {
        Self { curriculum }
    }

    /// Units of `lesson` not yet introduced, in curriculum order.
    pub fn pending_units(&self, lesson: i64, introduced: &HashSet<String>) -> Vec<String> {
        self.curriculum
            .units_for_lesson(lesson)
            .iter()
            .filter(|u| !introduced.contains(*u))
            .cloned()
            .collect()
    }

    /// Every item from lesson 1 through `lesson` whose unit decomposition
    /// is fully introduced. Order is curriculum order, lesson by lesson.
    pub fn unlocked_items(&self, lesson: i64, introduced: &HashSet<String>) -> Vec<&'a ContentItem> {
        let ceiling = lesson.min(self.curriculum.lesson_count());
        (1..=ceiling)
            .flat_map(|l| self.curriculum.items_for_lesson(l))
            .filter(|item| item.is_unlocked(introduced))
            .collect()
    }

    /// A lesson is complete once every unit it schedules is introduced.
    /// Word and sentence mastery is tracked by the scheduler, not gated
    /// here; holding learners on a lesson until every word is mastered
    /// starves the session of fresh material.
    pub fn lesson_complete(&self, lesson: i64, introduced: &HashSet<String>) -> bool {
        let units = self.curriculum.units_for_lesson(lesson);
        !units.is_empty() && units.iter().all(|u| introduced.contains(u))
    }

    /// Lesson the learner should sit at, given their current lesson.
    /// Advances one lesson at a time and never past the curriculum end.
    pub fn next_lesson(&self, current: i64, introduced: &HashSet<String>) -> i64 {
        if current < self.curriculum.lesson_count() && self.lesson_complete(current, introduced) {
            current + 1
        } else {
            current
        }
    }
}
