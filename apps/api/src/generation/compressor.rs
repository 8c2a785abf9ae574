//! Per-document content compression for prompt assembly.
//!
//! Short documents pass through untouched. Longer ones are reduced to a
//! fixed character budget, biased toward structurally significant lines
//! (problem/answer/importance markers, numbered sections and items) with a
//! backfill pass over the remaining substantive lines in original order.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

/// Documents at or under this many characters are used unmodified.
pub const PASS_THROUGH_LIMIT: usize = 800;
/// Character budget for a compressed document.
pub const COMPRESSION_BUDGET: usize = 600;
/// If priority lines fill less than this share of the budget, backfill.
const BACKFILL_THRESHOLD: f64 = 0.8;
/// Backfill ignores lines shorter than this after trimming.
const MIN_BACKFILL_LINE_CHARS: usize = 10;
/// Priority matching ignores lines at or under this length after trimming.
const MIN_PRIORITY_LINE_CHARS: usize = 5;

/// Structural-importance markers: problem, answer, important, definition,
/// formula.
const PRIORITY_MARKERS: [&str; 5] = ["問題", "解答", "重要", "定義", "公式"];

static NUMBERED_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"第?\d+章|第?\d+節|第?\d+問").unwrap());
static NUMBERED_ITEM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s").unwrap());

/// A line selected preferentially during compression.
fn is_priority_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.chars().count() > MIN_PRIORITY_LINE_CHARS
        && (PRIORITY_MARKERS.iter().any(|m| trimmed.contains(m))
            || NUMBERED_SECTION.is_match(trimmed)
            || NUMBERED_ITEM.is_match(trimmed))
}

/// Compresses `content` to the prompt budget. Priority lines accumulate
/// first; accumulation stops at the first line that would overflow the
/// budget. If they fill under 80% of it, non-trivial remaining lines
/// backfill in original order under the same overflow rule.
pub fn compress_content(content: &str, name: &str) -> String {
    if content.chars().count() <= PASS_THROUGH_LIMIT {
        return content.to_string();
    }

    let lines: Vec<&str> = content.split('\n').collect();
    let priority_lines: Vec<&str> = lines
        .iter()
        .copied()
        .filter(|l| is_priority_line(l))
        .collect();
    let priority_set: HashSet<&str> = priority_lines.iter().copied().collect();

    let mut selected: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for &line in &priority_lines {
        let len = line.chars().count();
        if current_len + len > COMPRESSION_BUDGET {
            break;
        }
        selected.push(line);
        current_len += len;
    }

    if (current_len as f64) < COMPRESSION_BUDGET as f64 * BACKFILL_THRESHOLD {
        for &line in &lines {
            if priority_set.contains(line) {
                continue;
            }
            if line.trim().chars().count() < MIN_BACKFILL_LINE_CHARS {
                continue;
            }
            let len = line.chars().count();
            if current_len + len > COMPRESSION_BUDGET {
                break;
            }
            selected.push(line);
            current_len += len;
        }
    }

    let result = selected.join("\n");
    info!(
        "{}: {}文字 → {}文字に圧縮",
        name,
        content.chars().count(),
        result.chars().count()
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_len(s: &str) -> usize {
        s.chars().count()
    }

    #[test]
    fn test_short_content_passes_through_unmodified() {
        let content = "重要: 光合成の定義。\n".repeat(10);
        assert!(char_len(&content) <= PASS_THROUGH_LIMIT);
        assert_eq!(compress_content(&content, "ノート"), content);
    }

    #[test]
    fn test_boundary_content_at_800_chars_is_untouched() {
        let content = "a".repeat(PASS_THROUGH_LIMIT);
        assert_eq!(compress_content(&content, "boundary"), content);
    }

    #[test]
    fn test_long_content_respects_budget() {
        let line = "これは特に目印のない普通の文章の行でやや長めです。"; // 25 chars
        let content = vec![line; 50].join("\n");
        assert!(char_len(&content) > PASS_THROUGH_LIMIT);

        let compressed = compress_content(&content, "長文");
        assert!(char_len(&compressed.replace('\n', "")) <= COMPRESSION_BUDGET);
    }

    #[test]
    fn test_priority_lines_come_before_backfill() {
        let filler = "普通の内容を説明しているだけの行です。"; // non-priority, >= 10 chars
        let mut lines: Vec<String> = vec![filler.to_string(); 40];
        // A priority line buried near the end of the document.
        lines.push("問題3: 光合成の化学式を書け。".to_string());
        let content = lines.join("\n");
        assert!(char_len(&content) > PASS_THROUGH_LIMIT);

        let compressed = compress_content(&content, "教材");
        let first_line = compressed.split('\n').next().unwrap();
        assert!(
            first_line.contains("問題3"),
            "priority line should lead: {first_line}"
        );
    }

    #[test]
    fn test_backfill_skipped_when_priority_fills_budget() {
        // 30 priority lines of 24 chars each ≈ 720 chars: budget fills from
        // priority alone and no plain line should appear.
        let priority = "重要事項: 必ず覚えるべき公式がある。"; // contains 重要 and 公式
        let filler = "これは埋め草に過ぎない説明の行です。";
        let mut lines = Vec::new();
        for _ in 0..30 {
            lines.push(priority);
            lines.push(filler);
        }
        let content = lines.join("\n");

        let compressed = compress_content(&content, "教材");
        assert!(compressed.contains("重要事項"));
        assert!(!compressed.contains("埋め草"));
    }

    #[test]
    fn test_backfill_fills_when_few_priority_lines() {
        let priority = "第1章 光合成"; // numbered section, > 5 chars
        let filler = "葉緑体の構造について詳しく説明する文。";
        let mut lines = vec![priority.to_string()];
        for _ in 0..60 {
            lines.push(filler.to_string());
        }
        let content = lines.join("\n");
        assert!(char_len(&content) > PASS_THROUGH_LIMIT);

        let compressed = compress_content(&content, "教材");
        assert!(compressed.contains(priority));
        assert!(compressed.contains(filler));
    }

    #[test]
    fn test_backfill_ignores_trivial_lines() {
        let short = "短い行"; // under 10 chars: never backfilled
        let filler = "マーカーを含まないがそれなりに長さのある説明文の行。";
        let mut lines = vec![short.to_string()];
        for _ in 0..40 {
            lines.push(filler.to_string());
        }
        let content = lines.join("\n");
        assert!(char_len(&content) > PASS_THROUGH_LIMIT);

        let compressed = compress_content(&content, "教材");
        assert!(!compressed.contains(short));
    }

    #[test]
    fn test_priority_detection() {
        assert!(is_priority_line("問題1: 次の式を解け"));
        assert!(is_priority_line("この定義は試験に出る"));
        assert!(is_priority_line("第12章 電磁気学"));
        assert!(is_priority_line("3. 酸化と還元について"));
        assert!(!is_priority_line("問題")); // too short
        assert!(!is_priority_line("ただの説明文である"));
    }
}
