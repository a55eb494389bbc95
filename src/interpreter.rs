//! Decodes remote replies into typed results.
//!
//! The service does not reliably follow the requested JSON shape, so a miss
//! is an expected outcome: it yields [`Interpreted::Raw`] holding the reply
//! exactly as received and the caller prints that instead.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// Outcome of interpreting one reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpreted<T> {
    Structured(T),
    Raw(String),
}

impl<T> Interpreted<T> {
    pub fn is_structured(&self) -> bool {
        matches!(self, Interpreted::Structured(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Issue {
    pub line: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub message: String,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalysisResult {
    pub issues: Vec<Issue>,
    pub suggestions: Vec<String>,
    pub summary: String,
    pub quality_score: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExplanationResult {
    pub summary: String,
    pub details: Vec<String>,
    pub complexity: String,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefactorResult {
    pub improvements: Vec<String>,
    pub explanation: String,
    #[serde(rename = "refactored")]
    pub refactored_code: String,
}

/// Generated code. The reply is used as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult(pub String);

/// A shape the interpreter can decode into.
pub trait ReplyShape: Sized {
    fn decode(raw: &str) -> Option<Self>;
}

impl ReplyShape for AnalysisResult {
    fn decode(raw: &str) -> Option<Self> {
        decode_json::<AnalysisResult>(raw).filter(|result| result.quality_score <= 100)
    }
}

impl ReplyShape for ExplanationResult {
    fn decode(raw: &str) -> Option<Self> {
        decode_json(raw)
    }
}

impl ReplyShape for RefactorResult {
    fn decode(raw: &str) -> Option<Self> {
        decode_json(raw)
    }
}

impl ReplyShape for GenerationResult {
    fn decode(raw: &str) -> Option<Self> {
        Some(GenerationResult(raw.to_string()))
    }
}

/// Interprets `raw` as `T`, falling back to the untouched text.
pub fn interpret<T: ReplyShape>(raw: &str) -> Interpreted<T> {
    match T::decode(raw) {
        Some(value) => Interpreted::Structured(value),
        None => {
            debug!("Reply did not match the expected shape, showing raw text");
            Interpreted::Raw(raw.to_string())
        }
    }
}

/// Tries the whole reply, then a ```json fence, then the outermost braces.
fn decode_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    if let Some(body) = fenced_json(trimmed) {
        if let Ok(value) = serde_json::from_str(body) {
            return Some(value);
        }
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&trimmed[start..=end]).ok()
}

fn fenced_json(text: &str) -> Option<&str> {
    let fence_start = text.find("```json")?;
    let after_fence = &text[fence_start + "```json".len()..];
    let fence_end = after_fence.find("```")?;
    Some(after_fence[..fence_end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS: &str = r#"{
        "issues": [
            {"line": 3, "type": "bug", "severity": "error", "message": "off by one", "suggestion": "use <"},
            {"line": 0, "type": "style", "severity": "info", "message": "missing docs"}
        ],
        "suggestions": ["add tests", "split function"],
        "summary": "Mostly fine",
        "quality_score": 72
    }"#;

    #[test]
    fn test_analysis_keeps_every_field() {
        let Interpreted::Structured(result) = interpret::<AnalysisResult>(ANALYSIS) else {
            panic!("expected structured result");
        };
        assert_eq!(result.quality_score, 72);
        assert_eq!(result.summary, "Mostly fine");
        assert_eq!(result.suggestions, vec!["add tests", "split function"]);
        assert_eq!(result.issues.len(), 2);
        assert_eq!(result.issues[0].line, 3);
        assert_eq!(result.issues[0].kind, "bug");
        assert_eq!(result.issues[0].severity, Severity::Error);
        assert_eq!(result.issues[0].suggestion.as_deref(), Some("use <"));
        assert_eq!(result.issues[1].severity, Severity::Info);
        assert!(result.issues[1].suggestion.is_none());
    }

    #[test]
    fn test_explanation_decodes() {
        let raw = r#"{"summary":"adds","details":["a","b"],"complexity":"O(1)","key_points":["pure"]}"#;
        assert_eq!(
            interpret::<ExplanationResult>(raw),
            Interpreted::Structured(ExplanationResult {
                summary: "adds".into(),
                details: vec!["a".into(), "b".into()],
                complexity: "O(1)".into(),
                key_points: vec!["pure".into()],
            })
        );
    }

    #[test]
    fn test_refactor_reads_refactored_key_and_ignores_original() {
        let raw = r#"{"original":"x=1","refactored":"X = 1","improvements":["naming"],"explanation":"constant"}"#;
        let Interpreted::Structured(result) = interpret::<RefactorResult>(raw) else {
            panic!("expected structured result");
        };
        assert_eq!(result.refactored_code, "X = 1");
        assert_eq!(result.improvements, vec!["naming"]);
    }

    #[test]
    fn test_fenced_reply_decodes() {
        let raw = format!("Here is the analysis:\n```json\n{}\n```\nHope it helps.", ANALYSIS);
        assert!(interpret::<AnalysisResult>(&raw).is_structured());
    }

    #[test]
    fn test_json_with_surrounding_prose_decodes() {
        let raw = format!("Sure! {} Let me know.", ANALYSIS);
        assert!(interpret::<AnalysisResult>(&raw).is_structured());
    }

    #[test]
    fn test_plain_text_falls_back_byte_for_byte() {
        let raw = "  The code looks fine.\nNo JSON here, sorry.\n";
        assert_eq!(interpret::<AnalysisResult>(raw), Interpreted::Raw(raw.to_string()));
    }

    #[test]
    fn test_partial_json_falls_back() {
        let raw = r#"{"issues": [{"line": 1, "type": "bug""#;
        assert_eq!(interpret::<AnalysisResult>(raw), Interpreted::Raw(raw.to_string()));
    }

    #[test]
    fn test_wrong_shape_falls_back() {
        let raw = r#"{"summary": "only a summary"}"#;
        assert!(!interpret::<ExplanationResult>(raw).is_structured());
    }

    #[test]
    fn test_unknown_severity_falls_back() {
        let raw = r#"{"issues":[{"line":1,"type":"x","severity":"fatal","message":"m"}],"suggestions":[],"summary":"s","quality_score":1}"#;
        assert!(!interpret::<AnalysisResult>(raw).is_structured());
    }

    #[test]
    fn test_score_above_hundred_falls_back() {
        let raw = r#"{"issues":[],"suggestions":[],"summary":"s","quality_score":101}"#;
        assert!(!interpret::<AnalysisResult>(raw).is_structured());
    }

    #[test]
    fn test_negative_line_falls_back() {
        let raw = r#"{"issues":[{"line":-1,"type":"x","severity":"info","message":"m"}],"suggestions":[],"summary":"s","quality_score":1}"#;
        assert!(!interpret::<AnalysisResult>(raw).is_structured());
    }

    #[test]
    fn test_generation_is_always_structured_verbatim() {
        let raw = "```python\nprint('hi')\n```";
        assert_eq!(
            interpret::<GenerationResult>(raw),
            Interpreted::Structured(GenerationResult(raw.to_string()))
        );
    }
}
