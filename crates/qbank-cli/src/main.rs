//! QBrush question bank CLI - main entry point.
//!
//! Loads a JSON question bank into an in-memory store, runs it through the
//! list engine, and prints the result.

mod render;

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{ArgAction, Parser, Subcommand};
use qbank_core::{Difficulty, EngineConfig, Question, QuestionType};
use qbank_engine::{QuestionListEngine, SortOption};
use qbank_store::InMemoryStore;

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Parser)]
#[command(name = "qbank", version, about)]
struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List questions grouped by type
    List(ListArgs),

    /// Print every tag used in the bank
    Tags {
        /// Path to a JSON array of questions
        bank: PathBuf,
    },
}

#[derive(Debug, clap::Args)]
struct ListArgs {
    /// Path to a JSON array of questions
    bank: PathBuf,

    /// Match any word, case-insensitively
    #[arg(short, long)]
    search: Option<String>,

    /// choice, fill_blank, judgment or free_answer
    #[arg(short = 't', long = "type")]
    question_type: Option<QuestionType>,

    /// easy, medium or hard
    #[arg(short, long)]
    difficulty: Option<Difficulty>,

    /// Keep questions carrying any of these tags
    #[arg(long = "tag")]
    tags: Vec<String>,

    #[arg(long, default_value_t = SortOption::default())]
    sort: SortOption,
}

// =============================================================================
// Setup
// =============================================================================

fn setup_logging(verbosity: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr so stdout stays pipeable.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn load_config() -> EngineConfig {
    match EngineConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Falling back to default config: {}", e);
            EngineConfig::default()
        }
    }
}

fn load_bank(path: &Path) -> anyhow::Result<Vec<Question>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let questions: Vec<Question> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a JSON array of questions", path.display()))?;
    tracing::info!(count = questions.len(), path = %path.display(), "Bank loaded");
    Ok(questions)
}

/// Build an engine over `bank` and load it.
///
/// A one-shot run has nothing to debounce, and the first page must hold the
/// whole bank.
async fn open_engine(bank: &Path) -> anyhow::Result<QuestionListEngine> {
    let questions = load_bank(bank)?;
    let config = load_config();
    let config = EngineConfig {
        search_debounce_ms: 0,
        page_size: questions.len().max(config.page_size),
        ..config
    };

    let store = InMemoryStore::new().with_questions(questions);
    let engine = QuestionListEngine::new(Arc::new(store), config);
    engine.reload().await?;
    Ok(engine)
}

/// Feed the list arguments to the engine. Returns the search text for highlighting.
fn apply_filters(engine: &QuestionListEngine, args: ListArgs) -> String {
    engine.set_type_filter(args.question_type);
    engine.set_difficulty_filter(args.difficulty);

    // Repeating a tag on the command line must not toggle it back off.
    let tags: BTreeSet<String> = args.tags.into_iter().collect();
    for tag in tags {
        engine.toggle_tag(tag);
    }
    engine.set_sort_option(args.sort);

    let search = args.search.unwrap_or_default();
    engine.set_search_text(search.clone());
    search
}

// =============================================================================
// Commands
// =============================================================================

impl Cli {
    async fn run(self) -> anyhow::Result<()> {
        let color = !self.no_color;
        let mut out = std::io::stdout().lock();

        match self.command {
            Command::List(args) => {
                let engine = open_engine(&args.bank).await?;
                let search = apply_filters(&engine, args);
                render::write_sections(&mut out, &engine.sections(), &search, color)?;
            }
            Command::Tags { bank } => {
                let engine = open_engine(&bank).await?;
                for tag in engine.available_tags() {
                    writeln!(out, "{tag}")?;
                }
            }
        }

        Ok(())
    }
}

// =============================================================================
// Entry Point
// =============================================================================

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to create tokio runtime")?;

    rt.block_on(cli.run())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list_arguments() {
        let cli = Cli::try_parse_from([
            "qbank", "list", "bank.json", "--type", "fill-blank", "--difficulty", "HARD", "--tag",
            "math", "--tag", "algebra", "--sort", "type-asc",
        ])
        .unwrap();

        let Command::List(args) = cli.command else {
            panic!("expected list");
        };
        assert_eq!(args.question_type, Some(QuestionType::FillBlank));
        assert_eq!(args.difficulty, Some(Difficulty::Hard));
        assert_eq!(args.tags, vec!["math", "algebra"]);
        assert_eq!(args.sort, SortOption::TypeAsc);
    }

    #[test]
    fn test_rejects_unknown_type() {
        assert!(Cli::try_parse_from(["qbank", "list", "bank.json", "--type", "essay"]).is_err());
    }

    fn write_bank(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("bank.json");
        std::fs::write(
            &path,
            r#"[
                {"id": "6f1c1a52-7f5e-4a43-9d5e-1f0e9a8b7c61", "content": "2 + 2 = ?", "type": "choice", "tags": "math"},
                {"id": "0b7e0b0e-54a4-4a49-8f0e-2c1e2f3a4b5c", "content": "The sky is green.", "type": "judgment"}
            ]"#,
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_open_engine_loads_bank() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bank(&dir);

        let engine = open_engine(&path).await.unwrap();
        assert_eq!(engine.visible_questions().len(), 2);
        assert_eq!(engine.available_tags(), vec!["math"]);
    }

    #[tokio::test]
    async fn test_repeated_tag_stays_selected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_bank(&dir);
        let cli = Cli::try_parse_from([
            "qbank",
            "list",
            path.to_str().unwrap(),
            "--tag",
            "math",
            "--tag",
            "math",
        ])
        .unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list");
        };

        let engine = open_engine(&path).await.unwrap();
        apply_filters(&engine, args);

        assert_eq!(engine.snapshot().filters.tags.len(), 1);
        let visible = engine.visible_questions();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].content, "2 + 2 = ?");
    }

    #[tokio::test]
    async fn test_open_engine_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = open_engine(&path).await.err().unwrap();
        assert!(err.to_string().contains("not a JSON array"));
    }
}
