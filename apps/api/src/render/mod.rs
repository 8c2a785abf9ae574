//! Render layer — turns a question into interactive HTML. Pure presentation;
//! no state, no failures.
//!
//! Multiple-choice detection is a textual heuristic inherited from stored
//! history: a question is multiple-choice iff all four of `A)`..`D)` appear
//! as substrings, and choices begin at line boundaries. It is deliberately
//! isolated in `parse_choices` so the heuristic can be replaced without
//! touching any caller.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::quiz::Question;

/// The four literal markers whose joint presence flags a multiple-choice
/// question.
pub const CHOICE_MARKERS: [&str; 4] = ["A)", "B)", "C)", "D)"];

static MARKER_AT_LINE_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-D]\)").unwrap());
static MARKER_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-D]\)\s*").unwrap());

/// One parsed choice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    /// The letter marker, e.g. `A)`.
    pub marker: String,
    /// Choice text with the marker stripped.
    pub text: String,
}

impl Choice {
    /// Correctness is substring containment of the letter marker in the
    /// stored answer, so an answer may name one or several letters.
    pub fn is_correct(&self, answer: &str) -> bool {
        answer.contains(&self.marker)
    }
}

/// Splits a multiple-choice question into its stem and choices.
///
/// Returns `None` unless all four markers are present. Splits occur at line
/// boundaries that open with a marker; continuation lines stay attached to
/// the segment above them, and the leading segment (everything before the
/// first marker line) is the stem.
pub fn parse_choices(text: &str) -> Option<(String, Vec<Choice>)> {
    if !CHOICE_MARKERS.iter().all(|m| text.contains(m)) {
        return None;
    }

    let mut segments: Vec<String> = Vec::new();
    let mut current = String::new();
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 && MARKER_AT_LINE_START.is_match(line) {
            segments.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    segments.push(current);

    let stem = segments[0].clone();
    let choices = segments[1..]
        .iter()
        .map(|segment| {
            let marker = MARKER_AT_LINE_START
                .find(segment)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();
            let text = MARKER_PREFIX.replace(segment, "").to_string();
            Choice { marker, text }
        })
        .collect();

    Some((stem, choices))
}

/// Renders one question as HTML. With `reveal_answer` false, choices render
/// neutrally behind a self-attempt prompt; with it true, correct choices are
/// marked. Non-multiple-choice questions render as a single text block.
pub fn render_question(question: &Question, reveal_answer: bool) -> String {
    let Some((stem, choices)) = parse_choices(&question.text) else {
        return format!(
            r#"<div class="question-text">{}</div>"#,
            escape_html(&question.text)
        );
    };

    let mut html = format!(r#"<div class="question-text">{}</div>"#, escape_html(&stem));
    html.push_str(r#"<div class="choices-container">"#);
    for choice in &choices {
        let correct = reveal_answer && choice.is_correct(&question.answer);
        let class = if correct {
            "choice-option correct"
        } else {
            "choice-option"
        };
        html.push_str(&format!(
            r#"<div class="{class}"><span class="choice-letter">{}</span><span class="choice-text">{}</span>"#,
            escape_html(&choice.marker),
            escape_html(&choice.text),
        ));
        if correct {
            html.push_str(r#"<span class="choice-badge">✓ 正解</span>"#);
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");

    if !reveal_answer {
        html.push_str(
            r#"<div class="self-attempt-hint">💡 まず自分で答えを考えてから「解説を見る」ボタンを押してください</div>"#,
        );
    }

    html
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
