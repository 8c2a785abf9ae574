//! Generation service — orchestrates the pipeline for one request.
//!
//! Flow: validate documents → compile prompt → LLM call → parse the mode's
//! JSON shape, degrading to a raw-text result when the model strays from it.
//! A shape mismatch is not a request failure; only provider errors abort.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::extract::SourceDocument;
use crate::generation::compiler::compile_prompt;
use crate::generation::prompts::{FOLLOW_UP_CONTEXT_HEADER, FOLLOW_UP_PROMPT_TEMPLATE};
use crate::llm_client::{
    prompts::{GENERATION_SYSTEM, QUESTION_SYSTEM},
    strip_json_fences, LlmClient, FOLLOW_UP_MAX_TOKENS, GENERATION_MAX_TOKENS,
};
use crate::models::quiz::{ExamPrepPayload, GenerationResult, Question, RawPayload, ReviewPayload};
use crate::models::settings::{GenerationSettings, Mode};

/// Context fields embedded in a follow-up prompt are cut to this many
/// characters, bounding prompt growth regardless of context size.
const CONTEXT_PREFIX_CHARS: usize = 100;

/// Returned verbatim when the follow-up provider call fails.
pub const FOLLOW_UP_APOLOGY: &str =
    "申し訳ありません。現在AIの回答を生成できません。しばらくしてからもう一度お試しください。";

/// Runs one generation request. Requires at least one non-empty document.
pub async fn generate(
    llm: &LlmClient,
    documents: &[SourceDocument],
    mode: Mode,
    settings: &GenerationSettings,
) -> Result<GenerationResult, AppError> {
    if !documents.iter().any(|d| !d.content.trim().is_empty()) {
        return Err(AppError::Validation(
            "ファイルまたはテキストを入力してください".to_string(),
        ));
    }

    let prompt = compile_prompt(documents, mode, settings);
    info!(
        "OpenAI API呼び出し開始: mode={}, documents={}",
        mode.as_str(),
        documents.len()
    );

    let output = llm
        .chat(GENERATION_SYSTEM, &prompt, GENERATION_MAX_TOKENS)
        .await?;
    info!("AI処理完了");

    Ok(parse_generation_output(&output, mode))
}

/// Try-parses the model output as the mode's expected shape (code fences
/// stripped first). Anything else degrades to `Raw` carrying the original
/// output text untouched.
pub fn parse_generation_output(output: &str, mode: Mode) -> GenerationResult {
    let candidate = strip_json_fences(output);
    let parsed = match mode {
        Mode::Review => {
            serde_json::from_str::<ReviewPayload>(candidate).map(GenerationResult::Review)
        }
        Mode::ExamPrep => {
            serde_json::from_str::<ExamPrepPayload>(candidate).map(GenerationResult::ExamPrep)
        }
    };

    match parsed {
        Ok(result) => result,
        Err(e) => {
            warn!("JSON解析エラー: {e}");
            GenerationResult::Raw(RawPayload {
                raw_response: output.to_string(),
            })
        }
    }
}

/// Answers a free-form follow-up question with bounded context. Provider
/// failures yield the fixed apology string instead of an error.
pub async fn answer_follow_up(llm: &LlmClient, question: &str, context: &[Question]) -> String {
    let prompt = build_question_prompt(question, context);
    match llm.chat(QUESTION_SYSTEM, &prompt, FOLLOW_UP_MAX_TOKENS).await {
        Ok(answer) => {
            info!("AI質問回答完了");
            answer
        }
        Err(e) => {
            warn!("AI質問処理エラー: {e}");
            FOLLOW_UP_APOLOGY.to_string()
        }
    }
}

/// Builds the follow-up prompt. Each context entry's question, answer, and
/// explanation is truncated to a 100-character prefix plus an ellipsis.
pub fn build_question_prompt(question: &str, context: &[Question]) -> String {
    let mut context_info = String::new();
    if !context.is_empty() {
        context_info.push_str(FOLLOW_UP_CONTEXT_HEADER);
        for (i, q) in context.iter().enumerate() {
            context_info.push_str(&format!(
                "問題{}: {}...\n",
                i + 1,
                truncate_chars(&q.text, CONTEXT_PREFIX_CHARS)
            ));
            context_info.push_str(&format!(
                "解答: {}...\n",
                truncate_chars(&q.answer, CONTEXT_PREFIX_CHARS)
            ));
            context_info.push_str(&format!(
                "解説: {}...\n\n",
                truncate_chars(&q.explanation, CONTEXT_PREFIX_CHARS)
            ));
        }
    }

    FOLLOW_UP_PROMPT_TEMPLATE
        .replace("{question}", question)
        .replace("{context_info}", &context_info)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_output_parses_into_review_variant() {
        let output = r#"{"questions":[{"question":"Q1","answer":"A","explanation":"E"}],"summary":"S"}"#;
        let result = parse_generation_output(output, Mode::Review);
        assert!(matches!(result, GenerationResult::Review(_)));
        assert_eq!(result.questions().len(), 1);
    }

    #[test]
    fn test_fenced_output_still_parses() {
        let output = "```json\n{\"questions\":[],\"summary\":\"要点\"}\n```";
        let result = parse_generation_output(output, Mode::Review);
        assert!(matches!(result, GenerationResult::Review(_)));
    }

    #[test]
    fn test_non_json_output_degrades_to_raw_with_original_text() {
        let output = "すみません、JSONでは答えられませんでした。";
        let result = parse_generation_output(output, Mode::Review);
        match result {
            GenerationResult::Raw(raw) => assert_eq!(raw.raw_response, output),
            other => panic!("expected raw fallback, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_mode_shape_degrades_to_raw() {
        // A review-shaped payload arriving in exam-prep mode is a shape
        // mismatch, not a partial success.
        let output = r#"{"questions":[],"summary":"S"}"#;
        let result = parse_generation_output(output, Mode::ExamPrep);
        assert!(matches!(result, GenerationResult::Raw(_)));
    }

    #[tokio::test]
    async fn test_generate_rejects_empty_documents_before_any_provider_call() {
        let llm = LlmClient::new("test-key".to_string());
        let settings = GenerationSettings {
            subject: "生物".to_string(),
            question_count: None,
            difficulty: Default::default(),
            question_type: Default::default(),
        };

        let err = generate(&llm, &[], Mode::Review, &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let blank = SourceDocument {
            name: "空.txt".to_string(),
            media_type: crate::extract::MediaType::Text,
            content: "   \n  ".to_string(),
        };
        let err = generate(&llm, &[blank], Mode::Review, &settings)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_follow_up_prompt_truncates_every_context_field() {
        let long = "あ".repeat(250);
        let context: Vec<Question> = (0..5)
            .map(|_| Question {
                text: long.clone(),
                answer: long.clone(),
                explanation: long.clone(),
            })
            .collect();

        let prompt = build_question_prompt("光合成とは？", &context);

        assert!(prompt.contains("学習者の質問: 光合成とは？"));
        assert!(prompt.contains("問題5:"));
        // No embedded field may exceed the 100-char prefix.
        let over_limit = "あ".repeat(CONTEXT_PREFIX_CHARS + 1);
        assert!(!prompt.contains(&over_limit));
        // Ellipsis follows each truncated field.
        let truncated = format!("{}...", "あ".repeat(CONTEXT_PREFIX_CHARS));
        assert!(prompt.contains(&truncated));
    }

    #[test]
    fn test_follow_up_prompt_without_context_omits_context_block() {
        let prompt = build_question_prompt("酸化とは？", &[]);
        assert!(!prompt.contains("現在表示されている問題情報"));
        assert!(prompt.contains("学習者の質問: 酸化とは？"));
    }
}
