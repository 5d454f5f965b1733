//! Filter, sort and group pipeline.
//!
//! Everything here is a pure function of the cached questions and the
//! current `FilterState`; the engine re-runs it after every state change
//! that can affect the visible list.
//!
//! ## Steps
//!
//! ```text
//! all questions
//!      │
//!      ▼
//! type ─► difficulty ─► search text ─► tags
//!      │
//!      ▼
//! stable sort by SortOption
//!      │
//!      ├──► visible questions
//!      └──► sections (grouped by type)
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use qbank_core::{Difficulty, Question, QuestionType};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::highlight::SearchPattern;

// =============================================================================
// Inputs
// =============================================================================

/// Ordering applied to the visible questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOption {
    /// Most recently updated first. Falls back to creation time.
    #[default]
    UpdatedDesc,
    /// Most recently created first.
    CreatedDesc,
    /// By type key, untyped first.
    TypeAsc,
    /// Easy, medium, hard, then unrated.
    DifficultyAsc,
}

impl SortOption {
    pub const ALL: [SortOption; 4] = [
        SortOption::UpdatedDesc,
        SortOption::CreatedDesc,
        SortOption::TypeAsc,
        SortOption::DifficultyAsc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOption::UpdatedDesc => "updated-desc",
            SortOption::CreatedDesc => "created-desc",
            SortOption::TypeAsc => "type-asc",
            SortOption::DifficultyAsc => "difficulty-asc",
        }
    }
}

impl fmt::Display for SortOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown sort option key.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown sort option: {0}")]
pub struct UnknownSortOption(pub String);

impl FromStr for SortOption {
    type Err = UnknownSortOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortOption::ALL
            .into_iter()
            .find(|option| option.as_str() == s.trim())
            .ok_or_else(|| UnknownSortOption(s.to_string()))
    }
}

/// Every input of the pipeline besides the questions themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search_text: String,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
    pub tags: BTreeSet<String>,
    pub sort: SortOption,
}

// =============================================================================
// Filter + sort
// =============================================================================

/// Run the pipeline: filter `all` by every criterion, then sort.
pub fn apply(all: &[Question], filters: &FilterState) -> Vec<Question> {
    let pattern = SearchPattern::new(&filters.search_text);

    let mut visible: Vec<Question> = all
        .iter()
        .filter(|q| passes_type(q, filters.question_type))
        .filter(|q| passes_difficulty(q, filters.difficulty))
        .filter(|q| passes_text(q, pattern.as_ref()))
        .filter(|q| passes_tags(q, &filters.tags))
        .cloned()
        .collect();

    sort(&mut visible, filters.sort);
    visible
}

/// Unset passes everything.
pub fn passes_type(question: &Question, selected: Option<QuestionType>) -> bool {
    selected.is_none() || question.question_type == selected
}

/// Unset passes everything.
pub fn passes_difficulty(question: &Question, selected: Option<Difficulty>) -> bool {
    selected.is_none() || question.difficulty == selected
}

/// Any search token occurs in the content (case-insensitive). No pattern passes everything.
pub fn passes_text(question: &Question, pattern: Option<&SearchPattern>) -> bool {
    pattern.map_or(true, |p| p.is_match(&question.content))
}

/// The question's tags intersect `selected`. Empty selection passes everything.
pub fn passes_tags(question: &Question, selected: &BTreeSet<String>) -> bool {
    if selected.is_empty() {
        return true;
    }
    !question.tag_set().is_disjoint(selected)
}

/// Stable sort in place.
pub fn sort(questions: &mut [Question], option: SortOption) {
    match option {
        SortOption::UpdatedDesc => questions.sort_by(|a, b| {
            or_earliest(b.last_activity()).cmp(&or_earliest(a.last_activity()))
        }),
        SortOption::CreatedDesc => {
            questions.sort_by(|a, b| or_earliest(b.created_at).cmp(&or_earliest(a.created_at)))
        }
        SortOption::TypeAsc => questions.sort_by(|a, b| type_sort_key(a).cmp(&type_sort_key(b))),
        SortOption::DifficultyAsc => questions.sort_by_key(|q| difficulty_rank(q.difficulty)),
    }
}

fn or_earliest(at: Option<DateTime<Utc>>) -> DateTime<Utc> {
    at.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn type_sort_key(question: &Question) -> &'static str {
    question
        .question_type
        .as_ref()
        .map(QuestionType::as_str)
        .unwrap_or("")
}

/// Missing difficulty sorts after hard.
fn difficulty_rank(difficulty: Option<Difficulty>) -> u8 {
    match difficulty {
        Some(Difficulty::Easy) => 0,
        Some(Difficulty::Medium) => 1,
        Some(Difficulty::Hard) => 2,
        None => 3,
    }
}

// =============================================================================
// Grouping
// =============================================================================

/// A titled group of visible questions sharing a type.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Type key, or `"uncategorized"`.
    pub title: String,

    /// Items in visible order.
    pub items: Vec<Question>,

    /// Latest `updated_at` (or `created_at`) among the items.
    pub latest: Option<DateTime<Utc>>,
}

impl Section {
    fn new(title: impl Into<String>, items: Vec<Question>) -> Self {
        let latest = items.iter().filter_map(Question::last_activity).max();
        Self {
            title: title.into(),
            items,
            latest,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Group visible questions into sections.
///
/// With a type filter set there is exactly one section holding everything
/// visible. Otherwise one section per distinct type key, ordered by key.
pub fn sections(visible: &[Question], selected_type: Option<QuestionType>) -> Vec<Section> {
    if let Some(question_type) = selected_type {
        return vec![Section::new(question_type.as_str(), visible.to_vec())];
    }

    let mut groups: BTreeMap<&'static str, Vec<Question>> = BTreeMap::new();
    for question in visible {
        groups
            .entry(question.type_key())
            .or_default()
            .push(question.clone());
    }

    groups
        .into_iter()
        .map(|(title, items)| Section::new(title, items))
        .collect()
}

/// Every distinct tag across `all`, sorted.
pub fn available_tags(all: &[Question]) -> Vec<String> {
    all.iter()
        .flat_map(Question::tag_set)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// =============================================================================
// Tests
// =============================================================================
