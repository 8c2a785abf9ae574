//! Content extraction — turns an uploaded file into plain text.
//!
//! The public contract is infallible: `extract` always returns a string.
//! Failures degrade to human-readable diagnostic strings that flow through
//! the prompt pipeline as ordinary document content, so one bad file never
//! aborts a request.

pub mod ocr;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};

/// Declared media type of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Text,
    Pdf,
    Image,
}

impl MediaType {
    /// Maps the multipart part's declared content type. Anything outside the
    /// accepted set is rejected by the upload filter before extraction runs.
    pub fn from_mime(mime: &str) -> Option<MediaType> {
        match mime {
            "text/plain" => Some(MediaType::Text),
            "application/pdf" => Some(MediaType::Pdf),
            "image/png" | "image/jpeg" | "image/jpg" => Some(MediaType::Image),
            _ => None,
        }
    }
}

/// One unit of source material: an uploaded file's extracted text or a
/// pasted text block. Immutable after extraction and discarded once the
/// generation request completes.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub media_type: MediaType,
    pub content: String,
}

/// Per-file extraction failures. Never escapes this module as an error —
/// the `Display` text doubles as the diagnostic content handed downstream.
#[derive(Debug, Error)]
pub(crate) enum ExtractionError {
    #[error("テキストファイルの読み込みに失敗しました: {0}")]
    TextRead(String),

    #[error("PDF処理エラーが発生しました: {0}")]
    Pdf(String),

    #[error("画像処理エラー: {0}")]
    Ocr(String),
}

/// Placeholder returned when a PDF parses but yields no text at all.
pub const PDF_NO_TEXT: &str =
    "このPDFからテキストを抽出できませんでした。画像ベースのPDFの可能性があります。";

/// Extracts plain text from the file at `path`. Never fails: extraction
/// problems are logged and returned as a diagnostic string instead.
pub async fn extract(path: &Path, media_type: MediaType) -> String {
    info!("ファイル処理開始: {}, タイプ: {:?}", path.display(), media_type);
    match try_extract(path, media_type).await {
        Ok(text) => text,
        Err(e) => {
            warn!("ファイル抽出に失敗: {}: {e}", path.display());
            e.to_string()
        }
    }
}

async fn try_extract(path: &Path, media_type: MediaType) -> Result<String, ExtractionError> {
    match media_type {
        MediaType::Text => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| ExtractionError::TextRead(e.to_string())),
        MediaType::Pdf => extract_pdf(path.to_path_buf()).await,
        MediaType::Image => ocr::recognize(path.to_path_buf()).await,
    }
}

/// PDF text extraction runs on the blocking pool; `pdf_extract` is CPU-bound.
async fn extract_pdf(path: PathBuf) -> Result<String, ExtractionError> {
    let text = tokio::task::spawn_blocking(move || pdf_extract::extract_text(&path))
        .await
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?
        .map_err(|e| ExtractionError::Pdf(e.to_string()))?;

    if text.trim().is_empty() {
        return Ok(PDF_NO_TEXT.to_string());
    }
    info!("PDF処理成功。テキスト長: {}文字", text.chars().count());
    Ok(text)
}
