//! Question list engine for the QBrush question bank.
//!
//! This crate turns a raw question list from a `QuestionStore` into what a
//! list screen shows:
//! - Filtered and sorted visible questions
//! - Sections grouped by question type
//! - The tag vocabulary
//! - Search highlight spans
//!
//! It also owns multi-selection and optimistic delete. See
//! [`QuestionListEngine`] for the entry point.

pub mod engine;
pub mod highlight;
pub mod observable;
pub mod pipeline;
pub mod selection;
pub mod state;

pub use engine::QuestionListEngine;
pub use highlight::{highlight, tokenize, SearchPattern, Span};
pub use observable::ObservableState;
pub use pipeline::{FilterState, Section, SortOption, UnknownSortOption};
pub use selection::{Selection, SelectionMode};
pub use state::{EngineSnapshot, Notification, NotificationKind, ReloadOutcome};
