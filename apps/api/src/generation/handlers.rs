//! Axum route handlers for the generation API.
//!
//! `POST /api/generate` accepts either a JSON body (pasted text only) or a
//! multipart form carrying up to three file fields alongside the same
//! settings fields. The multipart path enforces the upload filter: at most
//! 10 files per field, 10 MB per file, and only text/PDF/PNG/JPEG parts.

use std::collections::HashMap;

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::extract::{self, MediaType, SourceDocument};
use crate::generation::generator::{answer_follow_up, generate};
use crate::history::store::HistoryEntry;
use crate::models::quiz::{GenerationResult, Question};
use crate::models::settings::{Difficulty, GenerationSettings, Mode, QuestionType};
use crate::state::AppState;

/// Multipart field names that carry files.
const FILE_FIELDS: [&str; 3] = ["files", "pastExamFiles", "materialFiles"];
const MAX_FILES_PER_FIELD: usize = 10;
const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Document name given to the pasted-text block.
const PASTED_TEXT_NAME: &str = "手動入力テキスト";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// JSON body for `POST /api/generate`. The browser sends `questionCount` as
/// a string, so the field tolerates both representations.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateBody {
    pub mode: Mode,
    #[serde(default)]
    pub subject: String,
    #[serde(default, deserialize_with = "deserialize_count")]
    pub question_count: Option<u32>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub question_type: QuestionType,
    #[serde(default)]
    pub additional_text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub data: GenerationResult,
}

#[derive(Debug, Deserialize)]
pub struct AiQuestionRequest {
    pub question: String,
    #[serde(default)]
    pub context: Vec<Question>,
}

#[derive(Debug, Serialize)]
pub struct AiQuestionResponse {
    pub success: bool,
    pub answer: String,
}

/// One uploaded file, buffered before extraction.
struct UploadedFile {
    name: String,
    media_type: MediaType,
    bytes: Bytes,
}

/// Normalized input regardless of which body format arrived.
struct GenerateInput {
    mode: Mode,
    subject: String,
    question_count: Option<u32>,
    difficulty: Difficulty,
    question_type: QuestionType,
    additional_text: String,
    files: Vec<UploadedFile>,
}

fn deserialize_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCount {
        Number(u32),
        Text(String),
    }

    Ok(match Option::<RawCount>::deserialize(deserializer)? {
        None => None,
        Some(RawCount::Number(n)) => Some(n),
        Some(RawCount::Text(s)) => s.trim().parse().ok(),
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/generate
///
/// Extracts every uploaded file (per-file failures are logged and skipped),
/// appends the pasted text block, compiles the prompt, calls the model, and
/// returns the parsed result. A successful review-mode generation with a
/// named subject is also recorded into the history store.
pub async fn handle_generate(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<GenerateResponse>, AppError> {
    let input = read_generate_input(&state, request).await?;

    if input.files.is_empty() && input.additional_text.trim().is_empty() {
        return Err(AppError::Validation(
            "ファイルまたはテキストを入力してください".to_string(),
        ));
    }

    info!(
        "処理開始: モード={}, 教科={}",
        input.mode.as_str(),
        input.subject
    );

    let mut documents: Vec<SourceDocument> = Vec::new();
    for file in &input.files {
        match extract_upload(file).await {
            Ok(content) => documents.push(SourceDocument {
                name: file.name.clone(),
                media_type: file.media_type,
                content,
            }),
            Err(e) => warn!("ファイル処理エラー ({}): {e:#}", file.name),
        }
    }
    if !input.additional_text.trim().is_empty() {
        documents.push(SourceDocument {
            name: PASTED_TEXT_NAME.to_string(),
            media_type: MediaType::Text,
            content: input.additional_text.clone(),
        });
    }

    if documents.is_empty() {
        return Err(AppError::Validation(
            "ファイル内容の読み込みに失敗しました".to_string(),
        ));
    }
    for doc in &documents {
        debug!(
            "資料: {} ({:?}, {}文字)",
            doc.name,
            doc.media_type,
            doc.content.chars().count()
        );
    }

    let settings = GenerationSettings {
        subject: input.subject.clone(),
        question_count: input.question_count,
        difficulty: input.difficulty,
        question_type: input.question_type,
    };

    let data = generate(&state.llm, &documents, input.mode, &settings).await?;

    if input.mode == Mode::Review
        && !input.subject.trim().is_empty()
        && matches!(data, GenerationResult::Review(_))
    {
        let entry = HistoryEntry::new(input.subject.clone(), input.mode, settings, data.clone());
        // The generation itself succeeded; a storage failure must not turn
        // the response into an error.
        if let Err(e) = state.history.record(&entry).await {
            warn!("履歴の保存に失敗しました: {e:#}");
        }
    }

    Ok(Json(GenerateResponse {
        success: true,
        data,
    }))
}

/// POST /api/ai-question
pub async fn handle_ai_question(
    State(state): State<AppState>,
    Json(request): Json<AiQuestionRequest>,
) -> Result<Json<AiQuestionResponse>, AppError> {
    if request.question.trim().is_empty() {
        return Err(AppError::Validation(
            "質問が入力されていません".to_string(),
        ));
    }

    info!("AI質問受信: {}", request.question);
    let answer = answer_follow_up(&state.llm, &request.question, &request.context).await;

    Ok(Json(AiQuestionResponse {
        success: true,
        answer,
    }))
}

// ────────────────────────────────────────────────────────────────────────────
// Body parsing
// ────────────────────────────────────────────────────────────────────────────

async fn read_generate_input(
    state: &AppState,
    request: Request,
) -> Result<GenerateInput, AppError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if content_type.starts_with("multipart/form-data") {
        let multipart = Multipart::from_request(request, state)
            .await
            .map_err(|e| AppError::Validation(format!("マルチパートの解析に失敗しました: {e}")))?;
        parse_multipart(multipart).await
    } else {
        let Json(body) = Json::<GenerateBody>::from_request(request, state)
            .await
            .map_err(|e| {
                AppError::Validation(format!("リクエストボディの解析に失敗しました: {e}"))
            })?;
        Ok(GenerateInput {
            mode: body.mode,
            subject: body.subject,
            question_count: body.question_count,
            difficulty: body.difficulty,
            question_type: body.question_type,
            additional_text: body.additional_text,
            files: Vec::new(),
        })
    }
}

/// Walks the multipart stream, buffering files and collecting the settings
/// fields. Upload-filter violations reject the whole request.
async fn parse_multipart(mut multipart: Multipart) -> Result<GenerateInput, AppError> {
    let mut mode: Option<Mode> = None;
    let mut subject = String::new();
    let mut question_count: Option<u32> = None;
    let mut difficulty = Difficulty::default();
    let mut question_type = QuestionType::default();
    let mut additional_text = String::new();
    let mut files: Vec<UploadedFile> = Vec::new();
    let mut field_counts: HashMap<&'static str, usize> = HashMap::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("マルチパートの解析に失敗しました: {e}")))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if let Some(&slot) = FILE_FIELDS.iter().find(|f| **f == name) {
            let count = field_counts.entry(slot).or_insert(0);
            if *count >= MAX_FILES_PER_FIELD {
                return Err(AppError::UnsupportedUpload(
                    "ファイル数が上限を超えています".to_string(),
                ));
            }
            *count += 1;

            let declared = field.content_type().unwrap_or("").to_string();
            let Some(media_type) = MediaType::from_mime(&declared) else {
                return Err(AppError::UnsupportedUpload(
                    "対応していないファイル形式です".to_string(),
                ));
            };
            let file_name = field.file_name().unwrap_or("無題ファイル").to_string();
            let bytes = field.bytes().await.map_err(|e| {
                AppError::Validation(format!("ファイルの受信に失敗しました: {e}"))
            })?;
            if bytes.len() > MAX_FILE_BYTES {
                return Err(AppError::UnsupportedUpload(
                    "ファイルサイズが10MBを超えています".to_string(),
                ));
            }
            files.push(UploadedFile {
                name: file_name,
                media_type,
                bytes,
            });
        } else {
            let value = field.text().await.map_err(|e| {
                AppError::Validation(format!("フィールドの読み込みに失敗しました: {e}"))
            })?;
            match name.as_str() {
                "mode" => mode = Mode::parse(value.trim()),
                "subject" => subject = value,
                "questionCount" => question_count = value.trim().parse().ok(),
                "difficulty" => difficulty = Difficulty::parse(value.trim()).unwrap_or_default(),
                "questionType" => {
                    question_type = QuestionType::parse(value.trim()).unwrap_or_default()
                }
                "additionalText" => additional_text = value,
                _ => {}
            }
        }
    }

    let mode = mode.ok_or_else(|| AppError::Validation("モードの指定が不正です".to_string()))?;

    Ok(GenerateInput {
        mode,
        subject,
        question_count,
        difficulty,
        question_type,
        additional_text,
        files,
    })
}

/// Writes the uploaded bytes to a scratch file, extracts, and lets the
/// `NamedTempFile` guard delete the file on every path. The suffix matters:
/// the OCR wrapper rejects paths without a known image extension. Content
/// sniffing downstream does not depend on it being exact.
async fn extract_upload(file: &UploadedFile) -> anyhow::Result<String> {
    let suffix = match file.media_type {
        MediaType::Text => ".txt",
        MediaType::Pdf => ".pdf",
        MediaType::Image => ".png",
    };
    let tmp = tempfile::Builder::new().suffix(suffix).tempfile()?;
    tokio::fs::write(tmp.path(), &file.bytes).await?;
    Ok(extract::extract(tmp.path(), file.media_type).await)
}
