//! Quiz result shapes returned by the model and stored in history.

use serde::{Deserialize, Serialize};

/// A single generated question.
///
/// For multiple-choice questions, `text` embeds the four lettered choice
/// segments (`A)`..`D)`) directly in the question body and `answer` names
/// the correct letter(s). That is a textual convention carried over from
/// stored history — `crate::render::parse_choices` is the only place that
/// interprets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "question")]
    pub text: String,
    pub answer: String,
    pub explanation: String,
}

/// Review-mode payload: original questions plus a summary note.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPayload {
    pub questions: Vec<Question>,
    pub summary: String,
}

/// Exam-prep payload: pattern analysis, predicted questions, and notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamPrepPayload {
    pub analysis: String,
    pub predictions: Vec<Question>,
    pub notes: String,
}

/// Fallback payload when the model's output was not the expected JSON shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawPayload {
    pub raw_response: String,
}

/// Outcome of one generation request.
///
/// The three variants have disjoint key sets, so the untagged representation
/// round-trips unambiguously through history storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GenerationResult {
    Review(ReviewPayload),
    ExamPrep(ExamPrepPayload),
    Raw(RawPayload),
}

impl GenerationResult {
    /// The questions carried by this result, in payload order.
    /// `Raw` results carry none.
    pub fn questions(&self) -> &[Question] {
        match self {
            GenerationResult::Review(p) => &p.questions,
            GenerationResult::ExamPrep(p) => &p.predictions,
            GenerationResult::Raw(_) => &[],
        }
    }
}
