//! OCR extraction and cleanup for uploaded images.
//!
//! Tesseract runs with a combined Japanese+Latin language model; its raw
//! output then goes through a normalization pass that undoes the usual OCR
//! artifacts for non-spaced scripts: spurious gaps between adjacent kana or
//! kanji, full-width alphanumerics, and ragged blank-line runs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::ExtractionError;

const OCR_LANGUAGES: &str = "jpn+eng";
/// Tesseract page segmentation: fully automatic.
const PSM_AUTO: i32 = 3;
/// Tesseract engine: LSTM only.
const OEM_LSTM_ONLY: i32 = 1;

/// Below this share of alphanumeric/kana/kanji characters the recognition is
/// flagged as low-confidence rather than discarded.
const MEANINGFUL_RATIO_FLOOR: f64 = 0.1;

/// Diagnostic returned when cleanup leaves nothing at all.
pub const OCR_NO_TEXT: &str =
    "画像からテキストを抽出できませんでした。画像の品質を確認してください。";

static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n\s*\n").unwrap());
static HIRAGANA_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([あ-ん])\s+([あ-ん])").unwrap());
static KATAKANA_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([ア-ン])\s+([ア-ン])").unwrap());
static KANJI_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([一-龯])\s+([一-龯])").unwrap());
static EQUALS_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*=\s*").unwrap());
static PLUS_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*\+\s*").unwrap());
static MINUS_SPACING: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*-\s*").unwrap());
static LINE_LEADING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s+").unwrap());
static LINE_TRAILING_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)\s+$").unwrap());
static NEWLINE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").unwrap());
static MEANINGFUL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Z0-9あ-んア-ン一-龯]").unwrap());

/// Runs OCR on the image at `path` and returns the normalized text, wrapped
/// in the standard extraction framing (or a low-confidence warning).
pub(crate) async fn recognize(path: PathBuf) -> Result<String, ExtractionError> {
    info!("OCR処理開始: {}", path.display());
    let raw = tokio::task::spawn_blocking(move || run_tesseract(&path))
        .await
        .map_err(|e| ExtractionError::Ocr(e.to_string()))??;
    info!("OCR処理完了。テキスト長: {}文字", raw.chars().count());
    Ok(postprocess(&raw))
}

fn run_tesseract(path: &Path) -> Result<String, ExtractionError> {
    let image = rusty_tesseract::Image::from_path(path)
        .map_err(|e| ExtractionError::Ocr(e.to_string()))?;

    let args = rusty_tesseract::Args {
        lang: OCR_LANGUAGES.to_string(),
        dpi: None,
        psm: Some(PSM_AUTO),
        oem: Some(OEM_LSTM_ONLY),
        config_variables: HashMap::from([
            ("preserve_interword_spaces".to_string(), "1".to_string()),
            ("textord_min_xheight".to_string(), "10".to_string()),
        ]),
    };

    rusty_tesseract::image_to_string(&image, &args)
        .map_err(|e| ExtractionError::Ocr(e.to_string()))
}

/// Wraps cleaned OCR output in the extraction framing. Empty output becomes
/// the fixed diagnostic; a low meaningful-character ratio prepends a warning
/// instead of discarding the text.
pub fn postprocess(raw: &str) -> String {
    let cleaned = cleanup(raw);
    if cleaned.is_empty() {
        return OCR_NO_TEXT.to_string();
    }

    if meaningful_ratio(&cleaned) < MEANINGFUL_RATIO_FLOOR {
        format!(
            "画像からの文字認識精度が低い可能性があります。認識されたテキスト:\n{cleaned}\n\n※より鮮明な画像での再試行をお勧めします。"
        )
    } else {
        format!("画像から抽出されたテキスト内容:\n{cleaned}")
    }
}

/// The normalization pass, in fixed order: line endings, blank-line runs,
/// same-script gap removal, operator spacing, pipe misreads, full-width
/// alphanumerics, per-line edge whitespace, final collapse and trim.
pub fn cleanup(raw: &str) -> String {
    let text = raw.replace("\r\n", "\n").replace('\r', "\n");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = HIRAGANA_GAP.replace_all(&text, "$1$2");
    let text = KATAKANA_GAP.replace_all(&text, "$1$2");
    let text = KANJI_GAP.replace_all(&text, "$1$2");
    let text = EQUALS_SPACING.replace_all(&text, "=");
    let text = PLUS_SPACING.replace_all(&text, "+");
    let text = MINUS_SPACING.replace_all(&text, "-");
    let text = text.replace(['|', '｜'], "l");
    let text: String = text.chars().map(to_halfwidth).collect();
    let text = LINE_LEADING_WS.replace_all(&text, "");
    let text = LINE_TRAILING_WS.replace_all(&text, "");
    let text = NEWLINE_RUNS.replace_all(&text, "\n\n");
    text.trim().to_string()
}

/// Full-width digits and Latin letters map to their half-width equivalents
/// (offset 0xFEE0); everything else passes through.
fn to_halfwidth(c: char) -> char {
    match c {
        '０'..='９' | 'Ａ'..='Ｚ' | 'ａ'..='ｚ' => {
            char::from_u32(c as u32 - 0xFEE0).unwrap_or(c)
        }
        _ => c,
    }
}

/// Share of alphanumeric + kana + kanji characters in the text.
pub fn meaningful_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    MEANINGFUL_CHARS.find_iter(text).count() as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_unifies_line_endings() {
        assert_eq!(cleanup("a\r\nb\rc"), "a\nb\nc");
    }

    #[test]
    fn test_cleanup_collapses_blank_line_runs() {
        // The per-line leading-whitespace strip runs after the blank-run
        // collapse and eats what is left of the blank lines.
        assert_eq!(cleanup("一行目\n\n\n\n二行目"), "一行目\n二行目");
    }

    #[test]
    fn test_cleanup_removes_gaps_between_same_script_chars() {
        assert_eq!(cleanup("ひ らがな"), "ひらがな");
        assert_eq!(cleanup("カ タカナ"), "カタカナ");
        assert_eq!(cleanup("漢 字"), "漢字");
        // Mixed scripts keep their spacing.
        assert_eq!(cleanup("漢 カ"), "漢 カ");
    }

    #[test]
    fn test_cleanup_tightens_operators_and_fixes_pipe_misreads() {
        assert_eq!(cleanup("x = y + z"), "x=y+z");
        assert_eq!(cleanup("a | b｜c"), "a l blc");
    }

    #[test]
    fn test_cleanup_normalizes_fullwidth_alphanumerics() {
        assert_eq!(cleanup("１２３ＡＢｃ"), "123ABc");
    }

    #[test]
    fn test_cleanup_strips_per_line_edge_whitespace() {
        assert_eq!(cleanup("  序論  \n  本論  "), "序論\n本論");
    }

    #[test]
    fn test_meaningful_ratio_counts_script_characters() {
        assert!(meaningful_ratio("光合成abc123") > 0.9);
        assert!(meaningful_ratio("!!! ??? ---") < MEANINGFUL_RATIO_FLOOR);
        assert_eq!(meaningful_ratio(""), 0.0);
    }

    #[test]
    fn test_postprocess_empty_input_yields_fixed_diagnostic() {
        assert_eq!(postprocess(""), OCR_NO_TEXT);
        assert_eq!(postprocess("   \n \n  "), OCR_NO_TEXT);
    }

    #[test]
    fn test_postprocess_low_confidence_keeps_text_with_warning() {
        // Mostly punctuation: ratio below the floor but not empty.
        let result = postprocess("...,,,;;;```^^^~~~あ");
        assert!(result.contains("文字認識精度が低い可能性"));
        assert!(result.contains('あ'));
    }

    #[test]
    fn test_postprocess_normal_text_gets_extraction_framing() {
        let result = postprocess("光合成の仕 組みについて");
        assert!(result.starts_with("画像から抽出されたテキスト内容:\n"));
        assert!(result.contains("仕組み"));
    }
}
