//! Axum route handlers for the history and review-session API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::history::store::{HistoryEntry, ReviewCount, ReviewStrategy};
use crate::models::quiz::Question;
use crate::render::render_question;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubjectQuery {
    pub subject: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub entries: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub subject: String,
    pub strategy: ReviewStrategy,
    #[serde(default)]
    pub count: ReviewCount,
    /// When false the rendered markup hides correctness styling so the
    /// learner attempts the question first.
    #[serde(default)]
    pub reveal_answer: bool,
}

/// A selected question paired with its rendered markup.
#[derive(Debug, Serialize)]
pub struct ReviewQuestion {
    #[serde(flatten)]
    pub question: Question,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub questions: Vec<ReviewQuestion>,
}

/// GET /api/subjects
pub async fn handle_list_subjects(
    State(state): State<AppState>,
) -> Result<Json<SubjectsResponse>, AppError> {
    let subjects = state.history.list_subjects().await?;
    Ok(Json(SubjectsResponse { subjects }))
}

/// GET /api/history?subject=...
pub async fn handle_list_history(
    State(state): State<AppState>,
    Query(params): Query<SubjectQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let entries = state.history.list_by_subject(&params.subject).await?;
    Ok(Json(HistoryResponse { entries }))
}

/// POST /api/review
///
/// Selects questions from the subject's history per the requested strategy.
/// An empty selection is a successful response — the client shows
/// "nothing to review", it is not an error.
pub async fn handle_select_review(
    State(state): State<AppState>,
    Json(request): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, AppError> {
    let selected = state
        .history
        .select_for_review(&request.subject, request.strategy, request.count)
        .await?;

    let questions = selected
        .into_iter()
        .map(|question| {
            let html = render_question(&question, request.reveal_answer);
            ReviewQuestion { question, html }
        })
        .collect();

    Ok(Json(ReviewResponse {
        success: true,
        questions,
    }))
}
