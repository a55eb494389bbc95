//! The four operations: analyze, generate, explain, refactor.
//!
//! Each one resolves the language, calls the remote client, interprets the
//! reply and renders it. Input files are read before any network call so a
//! missing file never costs a request.

use crate::error::{AppError, AppResult};
use crate::files;
use crate::interpreter::{
    AnalysisResult, ExplanationResult, GenerationResult, Interpreted, RefactorResult, interpret,
};
use crate::remote_client::RemoteClient;
use crate::render;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const DEFAULT_LANGUAGE: &str = "javascript";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub description: String,
    pub language: String,
    pub output: Option<PathBuf>,
    pub context: Option<String>,
}

impl GenerateRequest {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            language: DEFAULT_LANGUAGE.to_string(),
            output: None,
            context: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefactorRequest {
    pub file: PathBuf,
    pub output: Option<PathBuf>,
    pub goals: Option<String>,
}

/// Empty answers mean "not given".
pub fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub async fn analyze<W: Write>(
    client: &RemoteClient<'_>,
    file: &Path,
    out: &mut W,
) -> AppResult<Interpreted<AnalysisResult>> {
    render::info(out, &format!("Analyzing file: {}", file.display()))?;
    let code = files::read_source(file)?;
    let language = files::language_for_path(file);

    let reply = client.analyze(&code, &language).await?;
    let result = interpret::<AnalysisResult>(&reply.text);
    match &result {
        Interpreted::Structured(analysis) => render::analysis(out, analysis)?,
        Interpreted::Raw(text) => render::raw(out, text)?,
    }
    Ok(result)
}

pub async fn explain<W: Write>(
    client: &RemoteClient<'_>,
    file: &Path,
    out: &mut W,
) -> AppResult<Interpreted<ExplanationResult>> {
    render::info(out, &format!("Explaining code from: {}", file.display()))?;
    let code = files::read_source(file)?;
    let language = files::language_for_path(file);

    let reply = client.explain(&code, &language).await?;
    let result = interpret::<ExplanationResult>(&reply.text);
    match &result {
        Interpreted::Structured(explanation) => render::explanation(out, explanation)?,
        Interpreted::Raw(text) => render::raw(out, text)?,
    }
    Ok(result)
}

pub async fn generate<W: Write>(
    client: &RemoteClient<'_>,
    request: &GenerateRequest,
    out: &mut W,
) -> AppResult<GenerationResult> {
    if request.description.trim().is_empty() {
        return Err(AppError::validation("Description cannot be empty"));
    }

    render::info(out, &format!("Generating {} code...", request.language))?;
    let reply = client
        .generate(&request.description, &request.language, request.context.as_deref())
        .await?;

    let code = match interpret::<GenerationResult>(&reply.text) {
        Interpreted::Structured(GenerationResult(code)) | Interpreted::Raw(code) => code,
    };
    render::generation(out, &code)?;

    if let Some(path) = &request.output {
        files::write_output(path, &code)?;
        render::success(out, &format!("Code saved to: {}", path.display()))?;
    }

    Ok(GenerationResult(code))
}

pub async fn refactor<W: Write>(
    client: &RemoteClient<'_>,
    request: &RefactorRequest,
    out: &mut W,
) -> AppResult<Interpreted<RefactorResult>> {
    render::info(out, &format!("Refactoring code from: {}", request.file.display()))?;
    let code = files::read_source(&request.file)?;
    let language = files::language_for_path(&request.file);

    let reply = client
        .refactor(&code, &language, request.goals.as_deref())
        .await?;
    let result = interpret::<RefactorResult>(&reply.text);

    match &result {
        Interpreted::Structured(refactored) => {
            render::refactor(out, refactored, &language)?;
            if let Some(path) = &request.output {
                files::write_output(path, &refactored.refactored_code)?;
                render::success(out, &format!("Refactored code saved to: {}", path.display()))?;
            }
        }
        Interpreted::Raw(text) => {
            render::raw(out, text)?;
            if let Some(path) = &request.output {
                info!("Unstructured refactor reply, skipping write to {}", path.display());
                render::warning(
                    out,
                    &format!(
                        "Reply was not in the expected format; nothing written to {}",
                        path.display()
                    ),
                )?;
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::http_client::testing::{MockHttpClient, completion};
    use std::fs;
    use tempfile::TempDir;

    const REFACTOR_REPLY: &str = r#"{"original":"x=1","refactored":"X = 1\n","improvements":["naming"],"explanation":"constant"}"#;

    fn creds() -> Credentials {
        Credentials::new("sk-test").unwrap()
    }

    fn user_prompt(http: &MockHttpClient) -> String {
        http.requests()[0].body["messages"][1]["content"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_analyze_unknown_extension_uses_raw_extension() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("foo.xyz");
        fs::write(&file, "blob").unwrap();

        let http = MockHttpClient::ok(&completion("not json"));
        let creds = creds();
        let mut out = Vec::new();
        let result = analyze(&RemoteClient::new(&http, &creds), &file, &mut out)
            .await
            .unwrap();

        assert_eq!(result, Interpreted::Raw("not json".into()));
        assert!(user_prompt(&http).contains("```xyz\nblob\n```"));
        assert!(String::from_utf8(out).unwrap().contains("not json"));
    }

    #[tokio::test]
    async fn test_analyze_missing_file_makes_no_request() {
        let dir = TempDir::new().unwrap();
        let http = MockHttpClient::ok(&completion("unused"));
        let creds = creds();
        let mut out = Vec::new();

        let err = analyze(&RemoteClient::new(&http, &creds), &dir.path().join("nope.rs"), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Filesystem { .. }));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_explain_renders_structured_reply() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("lib.rs");
        fs::write(&file, "fn add() {}").unwrap();

        let reply = r#"{"summary":"adds","details":["d1"],"complexity":"O(1)","key_points":["k1"]}"#;
        let http = MockHttpClient::ok(&completion(reply));
        let creds = creds();
        let mut out = Vec::new();
        let result = explain(&RemoteClient::new(&http, &creds), &file, &mut out)
            .await
            .unwrap();

        assert!(result.is_structured());
        assert!(user_prompt(&http).contains("rust"));
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Key Points"));
        assert!(text.contains("1. k1"));
    }

    #[tokio::test]
    async fn test_generate_rejects_blank_description() {
        let http = MockHttpClient::ok(&completion("code"));
        let creds = creds();
        let mut out = Vec::new();
        let err = generate(&RemoteClient::new(&http, &creds), &GenerateRequest::new("  "), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(http.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generate_writes_reply_to_output() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("gen").join("sort.py");
        let http = MockHttpClient::ok(&completion("def sort(xs): return sorted(xs)"));
        let creds = creds();
        let request = GenerateRequest {
            description: "sort a list".into(),
            language: "python".into(),
            output: Some(output.clone()),
            context: Some("stdlib only".into()),
        };

        let mut out = Vec::new();
        generate(&RemoteClient::new(&http, &creds), &request, &mut out)
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&output).unwrap(), "def sort(xs): return sorted(xs)");
        let prompt = user_prompt(&http);
        assert!(prompt.contains("Generate python code that: sort a list"));
        assert!(prompt.contains("stdlib only"));
    }

    #[tokio::test]
    async fn test_refactor_writes_only_refactored_code() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "x=1").unwrap();
        let output = dir.path().join("out").join("a.py");

        let http = MockHttpClient::ok(&completion(REFACTOR_REPLY));
        let creds = creds();
        let request = RefactorRequest {
            file,
            output: Some(output.clone()),
            goals: Some("naming".into()),
        };
        let mut out = Vec::new();
        let result = refactor(&RemoteClient::new(&http, &creds), &request, &mut out)
            .await
            .unwrap();

        assert!(result.is_structured());
        assert_eq!(fs::read_to_string(&output).unwrap(), "X = 1\n");
        assert!(user_prompt(&http).contains("Refactoring goals: naming"));
    }

    #[tokio::test]
    async fn test_refactor_raw_reply_skips_write() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("a.py");
        fs::write(&file, "x=1").unwrap();
        let output = dir.path().join("a_refactored.py");

        let http = MockHttpClient::ok(&completion("I would rename x."));
        let creds = creds();
        let request = RefactorRequest {
            file,
            output: Some(output.clone()),
            goals: None,
        };
        let mut out = Vec::new();
        let result = refactor(&RemoteClient::new(&http, &creds), &request, &mut out)
            .await
            .unwrap();

        assert_eq!(result, Interpreted::Raw("I would rename x.".into()));
        assert!(!output.exists());
        assert!(String::from_utf8(out).unwrap().contains("nothing written"));
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty(" out.py \n"), Some("out.py".to_string()));
    }
}
