//! Prompt compilation — deterministic assembly of the model prompt from
//! extracted documents, the mode, and the request settings.

use tracing::debug;

use crate::extract::SourceDocument;
use crate::generation::compressor::compress_content;
use crate::generation::prompts::{
    difficulty_clause, question_type_clause, BASE_INSTRUCTION_TEMPLATE, DEFAULT_EXAM_PREP_COUNT,
    DEFAULT_REVIEW_COUNT, DEFAULT_SUBJECT, EXAM_PREP_PROMPT_TEMPLATE, REVIEW_PROMPT_TEMPLATE,
};
use crate::models::settings::{GenerationSettings, Mode};

/// Builds the full prompt: preamble + compressed documents under labeled
/// headers + the mode-specific instruction block. Pure; identical inputs
/// yield byte-identical output.
pub fn compile_prompt(
    documents: &[SourceDocument],
    mode: Mode,
    settings: &GenerationSettings,
) -> String {
    let processed = documents
        .iter()
        .map(|doc| {
            format!(
                "【{}】\n{}\n",
                doc.name,
                compress_content(&doc.content, &doc.name)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    debug!("総処理文字数: {}文字", processed.chars().count());

    let base = BASE_INSTRUCTION_TEMPLATE.replace("{content}", &processed);

    let subject = if settings.subject.trim().is_empty() {
        DEFAULT_SUBJECT
    } else {
        settings.subject.as_str()
    };
    let default_count = match mode {
        Mode::Review => DEFAULT_REVIEW_COUNT,
        Mode::ExamPrep => DEFAULT_EXAM_PREP_COUNT,
    };
    let count = settings.question_count.unwrap_or(default_count);
    let template = match mode {
        Mode::Review => REVIEW_PROMPT_TEMPLATE,
        Mode::ExamPrep => EXAM_PREP_PROMPT_TEMPLATE,
    };

    let block = template
        .replace("{subject}", subject)
        .replace("{question_count}", &count.to_string())
        .replace("{difficulty}", settings.difficulty.as_str())
        .replace("{question_type}", settings.question_type.as_str())
        .replace(
            "{difficulty_instruction}",
            difficulty_clause(settings.difficulty, mode),
        )
        .replace(
            "{type_instruction}",
            question_type_clause(settings.question_type, mode),
        );

    base + &block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::MediaType;
    use crate::models::settings::{Difficulty, QuestionType};

    fn doc(name: &str, content: &str) -> SourceDocument {
        SourceDocument {
            name: name.to_string(),
            media_type: MediaType::Text,
            content: content.to_string(),
        }
    }

    fn settings() -> GenerationSettings {
        GenerationSettings {
            subject: "生物".to_string(),
            question_count: Some(3),
            difficulty: Difficulty::Standard,
            question_type: QuestionType::Multiple,
        }
    }

    #[test]
    fn test_short_document_embedded_unmodified() {
        let content = "光合成は光エネルギーを化学エネルギーに変換する反応である。";
        let prompt = compile_prompt(&[doc("教材.txt", content)], Mode::Review, &settings());
        assert!(prompt.contains(content));
        assert!(prompt.contains("【教材.txt】"));
    }

    #[test]
    fn test_each_document_gets_a_labeled_header() {
        let docs = [doc("第1章.pdf", "内容A"), doc("第2章.pdf", "内容B")];
        let prompt = compile_prompt(&docs, Mode::Review, &settings());
        assert!(prompt.contains("【第1章.pdf】"));
        assert!(prompt.contains("【第2章.pdf】"));
    }

    #[test]
    fn test_preamble_carries_non_duplication_directive() {
        let prompt = compile_prompt(&[doc("a", "b")], Mode::Review, &settings());
        assert!(prompt.contains("著作権遵守の重要な注意事項"));
        assert!(prompt.contains("全く同じ問題や文章は絶対に作成しないでください"));
    }

    #[test]
    fn test_review_block_substitutes_settings() {
        let prompt = compile_prompt(&[doc("a", "b")], Mode::Review, &settings());
        assert!(prompt.contains("【復習問題作成＆要点ノートモード】"));
        assert!(prompt.contains("教科: 生物"));
        assert!(prompt.contains("問題数: 3問"));
        assert!(prompt.contains("難易度: standard"));
        assert!(prompt.contains("出題形式: multiple"));
        // Multiple-choice mandates the literal lettered layout.
        assert!(prompt.contains("A) 選択肢1"));
        assert!(prompt.contains("D) 選択肢4"));
        // Review-mode JSON schema.
        assert!(prompt.contains(r#""questions""#));
        assert!(prompt.contains(r#""summary""#));
        assert!(!prompt.contains(r#""predictions""#));
    }

    #[test]
    fn test_exam_prep_block_uses_its_own_schema() {
        let prompt = compile_prompt(&[doc("過去問.pdf", "内容")], Mode::ExamPrep, &settings());
        assert!(prompt.contains("【じっくり対策モード】"));
        assert!(prompt.contains(r#""analysis""#));
        assert!(prompt.contains(r#""predictions""#));
        assert!(prompt.contains(r#""notes""#));
        assert!(!prompt.contains(r#""summary""#));
    }

    #[test]
    fn test_defaults_applied_for_missing_settings() {
        let bare = GenerationSettings {
            subject: String::new(),
            question_count: None,
            difficulty: Difficulty::default(),
            question_type: QuestionType::default(),
        };
        let review = compile_prompt(&[doc("a", "b")], Mode::Review, &bare);
        assert!(review.contains("教科: 学習内容"));
        assert!(review.contains("問題数: 5問"));

        let exam_prep = compile_prompt(&[doc("a", "b")], Mode::ExamPrep, &bare);
        assert!(exam_prep.contains("予想問題数: 3問"));
    }

    #[test]
    fn test_extraction_diagnostics_flow_into_prompt_as_content() {
        // A failed OCR pass yields a diagnostic string, which is still a
        // document and must reach the model like any other content.
        let diagnostic = crate::extract::ocr::OCR_NO_TEXT;
        let prompt = compile_prompt(&[doc("写真.png", diagnostic)], Mode::Review, &settings());
        assert!(prompt.contains(diagnostic));
        assert!(prompt.contains("【写真.png】"));
    }

    #[test]
    fn test_compilation_is_deterministic() {
        let docs = [doc("教材.txt", &"長い行のテキストです。".repeat(100))];
        let first = compile_prompt(&docs, Mode::Review, &settings());
        let second = compile_prompt(&docs, Mode::Review, &settings());
        assert_eq!(first, second);
    }

    #[test]
    fn test_long_document_is_compressed_into_prompt() {
        let filler = "マーカーを含まない長めの説明文の行である。";
        let content = vec![filler; 80].join("\n");
        let prompt = compile_prompt(&[doc("長文.txt", &content)], Mode::Review, &settings());
        // The full document must not appear; the compressed form must.
        assert!(!prompt.contains(&content));
        assert!(prompt.contains(filler));
    }
}
