//! Instruction templates, one per task kind.
//!
//! Every request is a single system message plus a single user message. The
//! user message embeds the payload and, for the structured tasks, the exact
//! JSON shape the reply must follow.

pub const SYSTEM_PROMPT: &str = "You are an expert software engineer and code reviewer. \
Answer precisely. When a JSON format is requested, reply with exactly one JSON object and no other text.";

const ANALYSIS_SHAPE: &str = r#"{
  "issues": [{"line": number, "type": string, "severity": "error|warning|info", "message": string, "suggestion": string}],
  "suggestions": [string],
  "summary": string,
  "quality_score": number (0-100)
}"#;

const EXPLANATION_SHAPE: &str = r#"{
  "summary": string,
  "details": [string],
  "complexity": string,
  "key_points": [string]
}"#;

const REFACTOR_SHAPE: &str = r#"{
  "original": string,
  "refactored": string,
  "improvements": [string],
  "explanation": string
}"#;

fn fenced(code: &str, language: &str) -> String {
    format!("```{}\n{}\n```", language, code)
}

pub fn analyze(code: &str, language: &str) -> String {
    format!(
        "Analyze the following {language} code for:
1. Potential bugs and issues
2. Performance problems
3. Security vulnerabilities
4. Code quality improvements
5. Best practices violations

Provide a detailed analysis with severity levels.

Code:
{code}

Format your response as JSON with the following structure:
{shape}",
        language = language,
        code = fenced(code, language),
        shape = ANALYSIS_SHAPE,
    )
}

pub fn generate(description: &str, language: &str, context: Option<&str>) -> String {
    let mut prompt = format!("Generate {} code that: {}", language, description);

    if let Some(context) = context {
        prompt.push_str(&format!("\n\nContext:\n{}", context));
    }

    prompt.push_str("\n\nProvide clean, well-commented, production-ready code.");
    prompt
}

pub fn explain(code: &str, language: &str) -> String {
    format!(
        "Explain the following {language} code in detail:

{code}

Provide:
1. A clear summary of what the code does
2. Detailed explanation of key parts
3. Time and space complexity if applicable
4. Key points to understand

Format as JSON:
{shape}",
        language = language,
        code = fenced(code, language),
        shape = EXPLANATION_SHAPE,
    )
}

pub fn refactor(code: &str, language: &str, goals: Option<&str>) -> String {
    let mut prompt = format!(
        "Refactor the following {} code for better quality, readability, and performance:\n\n{}",
        language,
        fenced(code, language)
    );

    if let Some(goals) = goals {
        prompt.push_str(&format!("\n\nRefactoring goals: {}", goals));
    }

    prompt.push_str(&format!(
        "\n\nProvide the refactored code with explanations.\n\nFormat as JSON:\n{}",
        REFACTOR_SHAPE
    ));
    prompt
}
