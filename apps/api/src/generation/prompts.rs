// All prompt templates for the generation module. System-role constants are
// in llm_client::prompts.
//
// Templates use `{placeholder}` substitution via `str::replace`. The literal
// JSON schema blocks are part of the contract with the model: the response
// parser expects exactly these key sets per mode.

use crate::models::settings::{Difficulty, Mode, QuestionType};

/// Subject used when the client did not name one.
pub const DEFAULT_SUBJECT: &str = "学習内容";
/// Default question count for review mode.
pub const DEFAULT_REVIEW_COUNT: u32 = 5;
/// Default predicted-question count for exam-prep mode.
pub const DEFAULT_EXAM_PREP_COUNT: u32 = 3;

/// Shared preamble: role framing, the non-duplication directive, and the
/// compressed file contents. Replace `{content}` before sending.
pub const BASE_INSTRUCTION_TEMPLATE: &str = r#"
あなたは教育専門のAIアシスタントです。以下の重要な制約を必ず守ってください：

【著作権遵守の重要な注意事項】
- 提供された資料と全く同じ問題や文章は絶対に作成しないでください
- すべての内容はオリジナルで、元の資料とは異なる表現・構成にしてください
- 同じ概念でも、異なる角度、異なる例、異なる問いかけで構成してください
- 既存の問題の単純な改変ではなく、完全に新しい問題を作成してください

ファイル内容：
{content}
"#;

/// Review-mode instruction block.
/// Replace: `{subject}`, `{question_count}`, `{difficulty}`,
/// `{question_type}`, `{difficulty_instruction}`, `{type_instruction}`.
pub const REVIEW_PROMPT_TEMPLATE: &str = r#"
【復習問題作成＆要点ノートモード】
教科: {subject}
問題数: {question_count}問
難易度: {difficulty}
出題形式: {question_type}

{difficulty_instruction}
{type_instruction}

上記の内容を分析し、以下を作成してください：

1. 復習問題（{question_count}問）：
   - 元の資料とは全く異なる新しい問題
   - 指定された難易度と形式に従った問題
   - 各問題に詳細な解答・解説

2. 要点ノート：
   - 重要概念を整理した構造的なまとめ
   - 図表や例を用いた理解しやすい説明
   - 元の資料とは異なる表現での要点整理

必ず以下のJSONフォーマットで返してください：
{
  "questions": [
    {
      "question": "問題文",
      "answer": "解答",
      "explanation": "詳細な解説"
    }
  ],
  "summary": "要点ノートの内容"
}"#;

/// Exam-prep instruction block (settings-aware variant).
/// Replace: `{subject}`, `{question_count}`, `{difficulty}`,
/// `{question_type}`, `{difficulty_instruction}`, `{type_instruction}`.
pub const EXAM_PREP_PROMPT_TEMPLATE: &str = r#"
【じっくり対策モード】
教科: {subject}
予想問題数: {question_count}問
難易度: {difficulty}
出題形式: {question_type}

{difficulty_instruction}
{type_instruction}

上記の過去問と授業教材を分析し、以下を作成してください：

重要：著作権保護のため、既存の問題と同じものは絶対に作成しないでください。

1. 関連性分析：過去問のパターンと授業内容の関連を分析
2. 予想問題（{question_count}問）：
   - 過去問のパターンを参考にした完全オリジナル問題
   - 指定された難易度と形式に従った問題
   - 新しい視点・角度からの問題設定
   - 各問題に詳細な解答・解説

3. 対策ノート：問題傾向と対策方法をまとめ

必ず以下のJSONフォーマットで返してください：
{
  "analysis": "関連性分析結果",
  "predictions": [
    {
      "question": "予想問題文",
      "answer": "解答",
      "explanation": "出題予想理由と詳細解説"
    }
  ],
  "notes": "対策ノートの内容"
}"#;

/// Follow-up question prompt.
/// Replace: `{question}`, `{context_info}`.
pub const FOLLOW_UP_PROMPT_TEMPLATE: &str = r#"あなたは学習支援AIアシスタントです。学習者からの質問に分かりやすく答えてください。

学習者の質問: {question}

{context_info}

以下の点を心がけて回答してください：
- 分かりやすく、簡潔に説明する
- 具体例があれば含める
- 学習者の理解を深めるヒントを提供する
- 200文字程度で回答する
- 問題について質問されている場合は、直接的な答えではなく考え方のヒントを提供する"#;

/// Header introducing the follow-up context block.
pub const FOLLOW_UP_CONTEXT_HEADER: &str = "\n\n現在表示されている問題情報：\n";

/// Difficulty clause — four fixed variants per mode.
pub fn difficulty_clause(difficulty: Difficulty, mode: Mode) -> &'static str {
    match (mode, difficulty) {
        (Mode::Review, Difficulty::Basic) => {
            "基礎的な理解を確認するレベルの問題を作成してください。"
        }
        (Mode::Review, Difficulty::Standard) => "標準的なレベルの問題を作成してください。",
        (Mode::Review, Difficulty::Advanced) => {
            "応用力を問う高度なレベルの問題を作成してください。"
        }
        (Mode::Review, Difficulty::Mixed) => {
            "基礎から応用まで様々なレベルの問題を混合して作成してください。"
        }
        (Mode::ExamPrep, Difficulty::Basic) => {
            "基礎的な理解を確認するレベルの予想問題を作成してください。"
        }
        (Mode::ExamPrep, Difficulty::Standard) => {
            "標準的なレベルの予想問題を作成してください。"
        }
        (Mode::ExamPrep, Difficulty::Advanced) => {
            "応用力を問う高度なレベルの予想問題を作成してください。"
        }
        (Mode::ExamPrep, Difficulty::Mixed) => {
            "基礎から応用まで様々なレベルの予想問題を混合して作成してください。"
        }
    }
}

/// Question-type clause — three fixed variants per mode. The
/// multiple-choice variants mandate the literal `A) B) C) D)` layout the
/// render layer's choice parser relies on.
pub fn question_type_clause(question_type: QuestionType, mode: Mode) -> &'static str {
    match (mode, question_type) {
        (Mode::Review, QuestionType::Multiple) => {
            "四択問題形式で作成してください。正解と3つの誤答選択肢を含めてください。

問題は以下の形式で作成してください：
問題文
A) 選択肢1
B) 選択肢2
C) 選択肢3
D) 選択肢4"
        }
        (Mode::Review, QuestionType::Descriptive) => {
            "記述問題形式で作成してください。論述や説明を求める問題にしてください。"
        }
        (Mode::Review, QuestionType::Mixed) => {
            "四択問題と記述問題を組み合わせて作成してください。"
        }
        (Mode::ExamPrep, QuestionType::Multiple) => {
            "四択問題形式で予想問題を作成してください。正解と3つの誤答選択肢を含めてください。

問題は以下の形式で作成してください：
問題文
A) 選択肢1
B) 選択肢2
C) 選択肢3
D) 選択肢4"
        }
        (Mode::ExamPrep, QuestionType::Descriptive) => {
            "記述問題形式で予想問題を作成してください。論述や説明を求める問題にしてください。"
        }
        (Mode::ExamPrep, QuestionType::Mixed) => {
            "四択問題と記述問題を組み合わせて予想問題を作成してください。"
        }
    }
}
