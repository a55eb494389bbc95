//! The interactive session: trust gate, config load, then the prompt loop.
//!
//! Everything runs on one input stream. A command that needs more answers
//! asks for them one at a time before it runs, and any failure inside a
//! command is printed as one line before the loop asks for the next input.

use crate::command_router::{Command, parse_command};
use crate::config::{CredentialStore, Credentials, DEFAULT_BASE_URL};
use crate::error::{AppError, AppResult};
use crate::http_client::HttpClient;
use crate::operations::{self, DEFAULT_LANGUAGE, GenerateRequest, RefactorRequest, non_empty};
use crate::remote_client::RemoteClient;
use crate::render;
use crate::trust_gate::TrustGate;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustState {
    Unverified,
    Denied,
    Trusted,
}

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// `/exit` or `/quit`.
    Exited,
    /// The input stream closed, possibly in the middle of a command.
    InputClosed,
    /// The user did not trust the working directory.
    TrustDenied,
}

enum Flow {
    Continue,
    Exit,
    InputClosed,
}

const NO_KEY_WARNING: &str = "No API key configured. Use /login to set your API key.";
const NO_KEY_ERROR: &str = "No API key configured. Use /login first.";

/// One interactive session over an input and an output stream.
pub struct Session<R, W> {
    working_dir: PathBuf,
    trust: TrustState,
    config: Option<Credentials>,
    running: bool,
    store: CredentialStore,
    http: Arc<dyn HttpClient>,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(
        working_dir: impl Into<PathBuf>,
        store: CredentialStore,
        http: Arc<dyn HttpClient>,
        input: R,
        output: W,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            trust: TrustState::Unverified,
            config: None,
            running: false,
            store,
            http,
            input,
            output,
        }
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn trust_state(&self) -> TrustState {
        self.trust
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.config.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    /// Runs the session until exit, closed input, or trust denial.
    ///
    /// Only a trust gate failure is returned as an error; command failures
    /// are printed and the loop carries on.
    pub async fn run(&mut self) -> AppResult<SessionEnd> {
        if !self.check_trust()? {
            return Ok(SessionEnd::TrustDenied);
        }

        self.show_welcome()?;
        self.load_config()?;

        self.running = true;
        let end = loop {
            let Some(line) = self.ask("\n> ")? else {
                break SessionEnd::InputClosed;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match self.dispatch(line).await {
                Flow::Continue => {}
                Flow::Exit => break SessionEnd::Exited,
                Flow::InputClosed => break SessionEnd::InputClosed,
            }
        };
        self.running = false;

        info!("Session ended: {:?}", end);
        Ok(end)
    }

    fn check_trust(&mut self) -> AppResult<bool> {
        let trusted =
            TrustGate::check_trust_with_io(&self.working_dir, &mut self.input, &mut self.output)?;
        self.trust = if trusted {
            TrustState::Trusted
        } else {
            TrustState::Denied
        };
        Ok(trusted)
    }

    fn load_config(&mut self) -> AppResult<()> {
        self.config = self.store.load();
        if self.config.is_none() {
            warn!("Starting without credentials");
            render::warning(&mut self.output, NO_KEY_WARNING)?;
        }
        Ok(())
    }

    /// Runs one line; errors end here as a single printed line.
    async fn dispatch(&mut self, line: &str) -> Flow {
        match self.execute(line).await {
            Ok(flow) => flow,
            Err(e) => {
                warn!("Command '{}' failed: {}", line, e);
                if let Err(write_error) = self.report(&e) {
                    warn!("Could not print error to console: {}", write_error);
                }
                Flow::Continue
            }
        }
    }

    async fn execute(&mut self, line: &str) -> AppResult<Flow> {
        let command = parse_command(line)?;

        if command.needs_credentials() && self.config.is_none() {
            return Err(AppError::validation(NO_KEY_ERROR));
        }

        match command {
            Command::Login => self.login().await,
            Command::Analyze(file) => self.analyze(&file).await,
            Command::Generate(description) => self.generate(description).await,
            Command::Explain(file) => self.explain(&file).await,
            Command::Refactor(file) => self.refactor(&file).await,
            Command::Help => {
                self.show_help()?;
                Ok(Flow::Continue)
            }
            Command::Shortcuts => {
                self.show_shortcuts()?;
                Ok(Flow::Continue)
            }
            Command::Exit => {
                writeln!(self.output, "\n👋 Goodbye!\n")?;
                Ok(Flow::Exit)
            }
            Command::Unknown(verb) => Err(AppError::validation(format!(
                "Unknown command: {}. Type /help for available commands.",
                verb
            ))),
        }
    }

    fn report(&mut self, error: &AppError) -> std::io::Result<()> {
        render::error(&mut self.output, &error.to_string())?;
        if error.needs_reauthentication() {
            render::info(&mut self.output, "Use /login to enter a new API key.")?;
        }
        Ok(())
    }

    /// Prints `question` and reads one answer. `None` when the input is closed.
    ///
    /// Bytes that are not UTF-8 are replaced rather than failing the read.
    fn ask(&mut self, question: &str) -> AppResult<Option<String>> {
        write!(self.output, "{}", question)?;
        self.output.flush()?;

        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        let line = String::from_utf8_lossy(&line);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.working_dir.join(path)
    }

    async fn login(&mut self) -> AppResult<Flow> {
        let Some(api_key) = self.ask("Enter your DeepSeek API key: ")? else {
            return Ok(Flow::InputClosed);
        };
        let api_key = api_key.trim().to_string();
        if api_key.is_empty() {
            return Err(AppError::validation("API key cannot be empty"));
        }

        writeln!(self.output, "Validating API key...")?;
        let base_url = self
            .config
            .as_ref()
            .map(|c| c.base_url().to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        if !RemoteClient::validate_key(self.http.as_ref(), &base_url, &api_key).await? {
            render::error(&mut self.output, "API key invalid, please run /login and type another API key")?;
            return Ok(Flow::Continue);
        }

        // Start from the persisted record; an environment key must not be saved.
        let credentials = match self.store.load_stored() {
            Some(mut existing) => {
                existing.set_api_key(api_key)?;
                existing
            }
            None => Credentials::new(api_key)?,
        };
        self.store.save(&credentials)?;

        render::success(&mut self.output, "API key is valid and has been saved!")?;
        writeln!(self.output, "API Key: {}", credentials.masked_key())?;
        self.config = Some(credentials);
        Ok(Flow::Continue)
    }

    async fn analyze(&mut self, file: &str) -> AppResult<Flow> {
        let path = self.resolve(file);
        let credentials = self.config.as_ref().ok_or_else(|| AppError::validation(NO_KEY_ERROR))?;
        let client = RemoteClient::new(self.http.as_ref(), credentials);
        operations::analyze(&client, &path, &mut self.output).await?;
        Ok(Flow::Continue)
    }

    async fn explain(&mut self, file: &str) -> AppResult<Flow> {
        let path = self.resolve(file);
        let credentials = self.config.as_ref().ok_or_else(|| AppError::validation(NO_KEY_ERROR))?;
        let client = RemoteClient::new(self.http.as_ref(), credentials);
        operations::explain(&client, &path, &mut self.output).await?;
        Ok(Flow::Continue)
    }

    async fn generate(&mut self, description: String) -> AppResult<Flow> {
        let Some(language) = self.ask(&format!("Programming language (default: {}): ", DEFAULT_LANGUAGE))? else {
            return Ok(Flow::InputClosed);
        };
        let Some(output) = self.ask("Output file path (optional): ")? else {
            return Ok(Flow::InputClosed);
        };

        let request = GenerateRequest {
            description,
            language: non_empty(&language).unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            output: non_empty(&output).map(|p| self.resolve(&p)),
            context: None,
        };

        let credentials = self.config.as_ref().ok_or_else(|| AppError::validation(NO_KEY_ERROR))?;
        let client = RemoteClient::new(self.http.as_ref(), credentials);
        operations::generate(&client, &request, &mut self.output).await?;
        Ok(Flow::Continue)
    }

    async fn refactor(&mut self, file: &str) -> AppResult<Flow> {
        let Some(output) = self.ask("Output file path (optional): ")? else {
            return Ok(Flow::InputClosed);
        };
        let Some(goals) = self.ask("Refactoring goals (optional): ")? else {
            return Ok(Flow::InputClosed);
        };

        let request = RefactorRequest {
            file: self.resolve(file),
            output: non_empty(&output).map(|p| self.resolve(&p)),
            goals: non_empty(&goals),
        };

        let credentials = self.config.as_ref().ok_or_else(|| AppError::validation(NO_KEY_ERROR))?;
        let client = RemoteClient::new(self.http.as_ref(), credentials);
        operations::refactor(&client, &request, &mut self.output).await?;
        Ok(Flow::Continue)
    }

    fn show_welcome(&mut self) -> AppResult<()> {
        writeln!(self.output, "╭─── DeepSeek Code {}", "─".repeat(40))?;
        writeln!(self.output, "│")?;
        writeln!(self.output, "│  🔍 Code Analysis & Generation")?;
        writeln!(self.output, "│  🚀 Powered by DeepSeek API")?;
        writeln!(self.output, "│")?;
        writeln!(self.output, "│  Tips for getting started:")?;
        writeln!(self.output, "│  • /login - Set or update your API key")?;
        writeln!(self.output, "│  • /analyze <file> - Analyze code in a file")?;
        writeln!(self.output, "│  • /generate <description> - Generate code")?;
        writeln!(self.output, "│  • /explain <file> - Explain code")?;
        writeln!(self.output, "│  • /refactor <file> - Refactor code")?;
        writeln!(self.output, "│  • /help - Show all commands")?;
        writeln!(self.output, "│  • /exit - Exit the application")?;
        writeln!(self.output, "╰{}", "─".repeat(58))?;
        Ok(())
    }

    fn show_help(&mut self) -> AppResult<()> {
        writeln!(self.output, "\n📚 Available Commands:\n")?;
        writeln!(self.output, "  /login                       Set or update your DeepSeek API key")?;
        writeln!(self.output, "  /analyze <file>              Analyze code for bugs and issues")?;
        writeln!(self.output, "  /generate <description>      Generate code from description")?;
        writeln!(self.output, "  /explain <file>              Get detailed explanation of code")?;
        writeln!(self.output, "  /refactor <file>             Refactor code for better quality")?;
        writeln!(self.output, "  /help                        Show this help message")?;
        writeln!(self.output, "  ?                            Show keyboard shortcuts")?;
        writeln!(self.output, "  /exit, /quit                 Exit the application\n")?;
        Ok(())
    }

    fn show_shortcuts(&mut self) -> AppResult<()> {
        writeln!(self.output, "\n⌨️  Keyboard Shortcuts:\n")?;
        writeln!(self.output, "  Ctrl+C          Exit application")?;
        writeln!(self.output, "  Ctrl+D          Close input and exit")?;
        writeln!(self.output, "  Ctrl+U          Clear current line\n")?;
        Ok(())
    }
}
