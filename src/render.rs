//! Console output for results and status lines.

use crate::interpreter::{AnalysisResult, ExplanationResult, RefactorResult, Severity};
use std::io::{self, Write};

pub fn success<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "✓ {}", message)
}

pub fn error<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "✗ {}", message)
}

pub fn warning<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "⚠ {}", message)
}

pub fn info<W: Write>(out: &mut W, message: &str) -> io::Result<()> {
    writeln!(out, "ℹ {}", message)
}

pub fn header<W: Write>(out: &mut W, title: &str) -> io::Result<()> {
    let rule = "━".repeat(40);
    writeln!(out, "\n{}\n{}\n{}\n", rule, title, rule)
}

fn numbered<W: Write>(out: &mut W, items: &[String]) -> io::Result<()> {
    for (i, item) in items.iter().enumerate() {
        writeln!(out, "{}. {}", i + 1, item)?;
    }
    Ok(())
}

/// Prints a reply that did not match the expected shape, unchanged.
pub fn raw<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    writeln!(out, "{}", text)
}

pub fn analysis<W: Write>(out: &mut W, result: &AnalysisResult) -> io::Result<()> {
    header(out, "Code Analysis Results")?;
    writeln!(out, "📊 Quality Score: {}/100\n", result.quality_score)?;

    if result.issues.is_empty() {
        success(out, "No issues found!")?;
    } else {
        warning(out, "Issues Found:")?;
        for (i, issue) in result.issues.iter().enumerate() {
            let icon = match issue.severity {
                Severity::Error => "❌",
                Severity::Warning => "⚠️",
                Severity::Info => "ℹ️",
            };
            writeln!(out, "\n{} Issue #{} (Line {})", icon, i + 1, issue.line)?;
            writeln!(out, "   Type: {}", issue.kind)?;
            writeln!(out, "   Message: {}", issue.message)?;
            if let Some(suggestion) = &issue.suggestion {
                writeln!(out, "   Suggestion: {}", suggestion)?;
            }
        }
    }

    if !result.suggestions.is_empty() {
        writeln!(out, "\n💡 Suggestions:")?;
        numbered(out, &result.suggestions)?;
    }

    writeln!(out, "\n📝 Summary:\n{}", result.summary)
}

pub fn explanation<W: Write>(out: &mut W, result: &ExplanationResult) -> io::Result<()> {
    header(out, "Code Explanation")?;
    writeln!(out, "📋 Summary:\n{}\n", result.summary)?;
    writeln!(out, "📚 Details:")?;
    numbered(out, &result.details)?;
    writeln!(out, "\n⏱️ Complexity: {}\n", result.complexity)?;
    writeln!(out, "🔑 Key Points:")?;
    numbered(out, &result.key_points)
}

pub fn refactor<W: Write>(out: &mut W, result: &RefactorResult, language: &str) -> io::Result<()> {
    header(out, "Code Refactoring Results")?;
    writeln!(out, "🔧 Improvements Made:")?;
    numbered(out, &result.improvements)?;
    writeln!(out, "\n📝 Explanation:\n{}", result.explanation)?;
    writeln!(out, "\n✨ Refactored Code:")?;
    writeln!(out, "```{}\n{}\n```", language, result.refactored_code)
}

pub fn generation<W: Write>(out: &mut W, code: &str) -> io::Result<()> {
    header(out, "Generated Code")?;
    writeln!(out, "{}", code)
}
