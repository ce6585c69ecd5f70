//! Static curriculum table and unlock logic.
//!
//! The curriculum is read-only to the engine: an ordered list of lessons,
//! each scheduling a set of phonetic units and a set of practice items
//! (units, words, sentences) built from units of that lesson or earlier.

pub mod unlock;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use unlock::UnlockEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Unit,
    Word,
    Sentence,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Word => "word",
            Self::Sentence => "sentence",
        }
    }
}

/// One immutable curriculum entry.
///
/// `units` is the decomposition into phonetic-unit ids; for a unit item it
/// is the item's own unit. An item is unlocked for a learner once every
/// unit in the decomposition has been introduced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub key: String,
    pub kind: ContentKind,
    pub text: String,
    pub units: Vec<String>,
    pub lesson: i64,
}

impl ContentItem {
    pub fn unit(id: &str, lesson: i64) -> Self {
        Self {
            key: format!("unit:{id}"),
            kind: ContentKind::Unit,
            text: id.to_string(),
            units: vec![id.to_string()],
            lesson,
        }
    }

    pub fn word(text: &str, units: &[&str], lesson: i64) -> Self {
        Self {
            key: format!("word:{text}"),
            kind: ContentKind::Word,
            text: text.to_string(),
            units: units.iter().map(|u| u.to_string()).collect(),
            lesson,
        }
    }

    pub fn sentence(text: &str, units: &[&str], lesson: i64) -> Self {
        Self {
            key: format!("sentence:{}", text.replace(' ', "-")),
            kind: ContentKind::Sentence,
            text: text.to_string(),
            units: units.iter().map(|u| u.to_string()).collect(),
            lesson,
        }
    }

    /// True once every unit in the decomposition has been introduced.
    pub fn is_unlocked(&self, introduced: &HashSet<String>) -> bool {
        self.units.iter().all(|u| introduced.contains(u))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub index: i64,
    pub units: Vec<String>,
}

/// Read-only curriculum table. Lessons are 1-based; item order within a
/// lesson is the curriculum-defined presentation order.
#[derive(Debug, Clone, Default)]
pub struct Curriculum {
    lessons: Vec<Lesson>,
    items: Vec<ContentItem>,
}

impl Curriculum {
    pub fn new(lessons: Vec<Lesson>, items: Vec<ContentItem>) -> Self {
        Self { lessons, items }
    }

    pub fn lesson_count(&self) -> i64 {
        self.lessons.len() as i64
    }

    pub fn units_for_lesson(&self, lesson: i64) -> &[String] {
        self.lessons
            .iter()
            .find(|l| l.index == lesson)
            .map(|l| l.units.as_slice())
            .unwrap_or(&[])
    }

    /// Items targeted at `lesson`, in curriculum order.
    pub fn items_for_lesson(&self, lesson: i64) -> Vec<&ContentItem> {
        self.items.iter().filter(|i| i.lesson == lesson).collect()
    }

    pub fn get(&self, item_key: &str) -> Option<&ContentItem> {
        self.items.iter().find(|i| i.key == item_key)
    }

    pub fn all_items(&self) -> &[ContentItem] {
        &self.items
    }

    /// Small built-in curriculum covering the first phonics lessons.
    /// Production curricula are loaded from the content asset table; this
    /// one backs tests and local runs.
    pub fn starter() -> Self {
        let lessons = vec![
            Lesson {
                index: 1,
                units: vec!["s", "a", "t", "p"].into_iter().map(String::from).collect(),
            },
            Lesson {
                index: 2,
                units: vec!["i", "n", "m", "d"].into_iter().map(String::from).collect(),
            },
            Lesson {
                index: 3,
                units: vec!["g", "o", "c", "k"].into_iter().map(String::from).collect(),
            },
        ];

        let items = vec![
            ContentItem::unit("s", 1),
            ContentItem::unit("a", 1),
            ContentItem::unit("t", 1),
            ContentItem::unit("p", 1),
            ContentItem::word("at", &["a", "t"], 1),
            ContentItem::word("sat", &["s", "a", "t"], 1),
            ContentItem::word("tap", &["t", "a", "p"], 1),
            ContentItem::word("pat", &["p", "a", "t"], 1),
            ContentItem::unit("i", 2),
            ContentItem::unit("n", 2),
            ContentItem::unit("m", 2),
            ContentItem::unit("d", 2),
            ContentItem::word("sit", &["s", "i", "t"], 2),
            ContentItem::word("pin", &["p", "i", "n"], 2),
            ContentItem::word("mat", &["m", "a", "t"], 2),
            ContentItem::sentence("sam sat", &["s", "a", "m", "t"], 2),
            ContentItem::unit("g", 3),
            ContentItem::unit("o", 3),
            ContentItem::unit("c", 3),
            ContentItem::unit("k", 3),
            ContentItem::word("dog", &["d", "o", "g"], 3),
            ContentItem::word("cat", &["c", "a", "t"], 3),
            ContentItem::sentence("the cat sat", &["t", "c", "a", "s"], 3),
        ];

        Self::new(lessons, items)
    }
}
