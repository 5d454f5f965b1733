//! Terminal rendering for sections and questions.

use std::io::{self, Write};

use owo_colors::OwoColorize;
use qbank_core::{split_tags, Question};
use qbank_engine::{highlight, Section};

/// Print each section as a header followed by its questions.
pub fn write_sections(
    out: &mut impl Write,
    sections: &[Section],
    search: &str,
    color: bool,
) -> io::Result<()> {
    if sections.is_empty() {
        return writeln!(out, "No questions match.");
    }

    for (i, section) in sections.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let header = format!("{} ({})", section.title, section.count());
        if color {
            writeln!(out, "{}", header.bold())?;
        } else {
            writeln!(out, "{header}")?;
        }
        for question in &section.items {
            write_question(out, question, search, color)?;
        }
    }
    Ok(())
}

fn write_question(
    out: &mut impl Write,
    question: &Question,
    search: &str,
    color: bool,
) -> io::Result<()> {
    write!(out, "  {}  ", difficulty_badge(question))?;

    for span in highlight(&question.content, search) {
        if color && span.highlighted {
            write!(out, "{}", span.text.yellow().bold())?;
        } else {
            write!(out, "{}", span.text)?;
        }
    }

    let tags: Vec<&str> = question
        .tags
        .as_deref()
        .map(|t| split_tags(t).collect())
        .unwrap_or_default();
    if !tags.is_empty() {
        let label = format!("[{}]", tags.join(", "));
        if color {
            write!(out, "  {}", label.dimmed())?;
        } else {
            write!(out, "  {label}")?;
        }
    }

    writeln!(out)
}

/// Filled stars for the difficulty, `---` when unset.
fn difficulty_badge(question: &Question) -> String {
    match question.difficulty {
        Some(d) => format!("{}{}", "★".repeat(d.stars()), "☆".repeat(3 - d.stars())),
        None => "---".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbank_core::{Difficulty, QuestionType};
    use qbank_engine::pipeline;

    fn render(questions: &[Question], search: &str) -> String {
        let sections = pipeline::sections(questions, None);
        let mut out = Vec::new();
        write_sections(&mut out, &sections, search, false).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_plain_rendering() {
        let questions = vec![
            Question::new("What is 2 + 2?")
                .of_type(QuestionType::SingleChoice)
                .of_difficulty(Difficulty::Easy)
                .tagged("math, arithmetic"),
            Question::new("Water boils at 100C.").of_type(QuestionType::Judgment),
        ];

        let text = render(&questions, "");
        assert_eq!(
            text,
            "choice (1)\n  ★☆☆  What is 2 + 2?  [math, arithmetic]\n\njudgment (1)\n  ---  Water boils at 100C.\n"
        );
    }

    #[test]
    fn test_empty_rendering() {
        assert_eq!(render(&[], "x"), "No questions match.\n");
    }

    #[test]
    fn test_colored_rendering_marks_matches() {
        let questions = vec![Question::new("Name the capital").of_difficulty(Difficulty::Hard)];
        let sections = pipeline::sections(&questions, None);

        let mut out = Vec::new();
        write_sections(&mut out, &sections, "capital", true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("★★★"));
        assert!(text.contains("\u{1b}["));
        assert!(text.contains("capital"));
    }
}
