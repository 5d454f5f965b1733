//! The question entity and its field enumerations.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Stable question identifier. Immutable once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub Uuid);

impl QuestionId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for QuestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for QuestionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// Kind of question.
///
/// The string key doubles as the section title when results are grouped,
/// so sections order by these keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionType {
    #[serde(rename = "choice", alias = "single_choice")]
    SingleChoice,
    #[serde(rename = "fill_blank")]
    FillBlank,
    #[serde(rename = "judgment")]
    Judgment,
    #[serde(rename = "free_answer")]
    FreeAnswer,
}

impl QuestionType {
    /// All question types.
    pub const ALL: [QuestionType; 4] = [
        QuestionType::SingleChoice,
        QuestionType::FillBlank,
        QuestionType::Judgment,
        QuestionType::FreeAnswer,
    ];

    /// Stable lowercase key.
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::SingleChoice => "choice",
            QuestionType::FillBlank => "fill_blank",
            QuestionType::Judgment => "judgment",
            QuestionType::FreeAnswer => "free_answer",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "choice" | "single_choice" => Ok(QuestionType::SingleChoice),
            "fill_blank" => Ok(QuestionType::FillBlank),
            "judgment" => Ok(QuestionType::Judgment),
            "free_answer" | "answer" => Ok(QuestionType::FreeAnswer),
            _ => Err(ValidationError::InvalidType(s.to_string())),
        }
    }
}

/// Question difficulty. Ordered `Easy < Medium < Hard`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Stable lowercase key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// Number of stars shown for this difficulty.
    pub fn stars(&self) -> usize {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ValidationError::InvalidDifficulty(s.to_string())),
        }
    }
}

// =============================================================================
// Question
// =============================================================================

/// A question in the bank.
///
/// `content` is never empty for a persisted question; that is enforced by the
/// service layer, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,

    pub content: String,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,

    /// Comma-separated tag list, e.g. `"math, algebra"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// Refreshed on every mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Question {
    /// Create a question with a fresh id and only content set.
    pub fn new(content: impl Into<String>) -> Self {
        Self::with_id(QuestionId::new(), content)
    }

    /// Create a question with the given id and only content set.
    pub fn with_id(id: QuestionId, content: impl Into<String>) -> Self {
        Self {
            id,
            content: content.into(),
            question_type: None,
            difficulty: None,
            options: None,
            correct_answer: None,
            analysis: None,
            tags: None,
            created_by: None,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn of_type(mut self, question_type: QuestionType) -> Self {
        self.question_type = Some(question_type);
        self
    }

    pub fn of_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn tagged(mut self, tags: impl Into<String>) -> Self {
        self.tags = Some(tags.into());
        self
    }

    pub fn created(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    pub fn updated(mut self, at: DateTime<Utc>) -> Self {
        self.updated_at = Some(at);
        self
    }

    /// Trimmed, de-duplicated tag tokens.
    pub fn tag_set(&self) -> BTreeSet<String> {
        self.tags
            .as_deref()
            .map(|tags| split_tags(tags).map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// `updated_at`, falling back to `created_at`.
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }

    /// Grouping key: the type key, or `"uncategorized"`.
    pub fn type_key(&self) -> &'static str {
        self.question_type
            .as_ref()
            .map(QuestionType::as_str)
            .unwrap_or(UNCATEGORIZED)
    }
}

/// Section title for questions without a type.
pub(crate) const UNCATEGORIZED: &str = "uncategorized";

/// Split a comma-separated tag list into trimmed, non-empty tokens.
pub fn split_tags(tags: &str) -> impl Iterator<Item = &str> {
    tags.split(',').map(str::trim).filter(|t| !t.is_empty())
}

// =============================================================================
// Field sets
// =============================================================================

/// Fields for creating a question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewQuestion {
    pub content: String,
    pub question_type: Option<QuestionType>,
    pub difficulty: Difficulty,
    pub options: Option<String>,
    pub correct_answer: Option<String>,
    pub analysis: Option<String>,
    pub tags: Option<String>,
    pub created_by: Option<String>,
}

impl NewQuestion {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionChanges {
    pub content: Option<String>,
    pub question_type: Option<QuestionType>,
    pub difficulty: Option<Difficulty>,
    pub options: Option<String>,
    pub correct_answer: Option<String>,
    pub analysis: Option<String>,
    pub tags: Option<String>,
}

impl QuestionChanges {
    /// Apply the supplied fields to `question`. Timestamps are the store's job.
    pub fn apply_to(self, question: &mut Question) {
        if let Some(content) = self.content {
            question.content = content;
        }
        if let Some(question_type) = self.question_type {
            question.question_type = Some(question_type);
        }
        if let Some(difficulty) = self.difficulty {
            question.difficulty = Some(difficulty);
        }
        if let Some(options) = self.options {
            question.options = Some(options);
        }
        if let Some(correct_answer) = self.correct_answer {
            question.correct_answer = Some(correct_answer);
        }
        if let Some(analysis) = self.analysis {
            question.analysis = Some(analysis);
        }
        if let Some(tags) = self.tags {
            question.tags = Some(tags);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
