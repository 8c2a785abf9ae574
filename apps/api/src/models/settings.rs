//! Request-scoped generation settings and their enum vocabulary.

use serde::{Deserialize, Serialize};

/// Top-level behavior switch for a generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Study-material quizzing: produces review questions plus a summary note.
    Review,
    /// Past-exam-pattern prediction: produces an analysis, predicted
    /// questions, and preparation notes.
    ExamPrep,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Mode> {
        match s {
            "review" => Some(Mode::Review),
            "examPrep" => Some(Mode::ExamPrep),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Review => "review",
            Mode::ExamPrep => "examPrep",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basic,
    #[default]
    Standard,
    Advanced,
    Mixed,
}

impl Difficulty {
    pub fn parse(s: &str) -> Option<Difficulty> {
        match s {
            "basic" => Some(Difficulty::Basic),
            "standard" => Some(Difficulty::Standard),
            "advanced" => Some(Difficulty::Advanced),
            "mixed" => Some(Difficulty::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Basic => "basic",
            Difficulty::Standard => "standard",
            Difficulty::Advanced => "advanced",
            Difficulty::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Multiple,
    Descriptive,
    #[default]
    Mixed,
}

impl QuestionType {
    pub fn parse(s: &str) -> Option<QuestionType> {
        match s {
            "multiple" => Some(QuestionType::Multiple),
            "descriptive" => Some(QuestionType::Descriptive),
            "mixed" => Some(QuestionType::Mixed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Multiple => "multiple",
            QuestionType::Descriptive => "descriptive",
            QuestionType::Mixed => "mixed",
        }
    }
}

/// Per-request quiz settings. Nothing here is persisted beyond the request
/// except as part of a recorded history entry.
///
/// `question_count` stays `None` when the client omitted it (or sent
/// something unparsable); the prompt compiler substitutes the per-mode
/// default at compile time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationSettings {
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub question_count: Option<u32>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub question_type: QuestionType,
}
