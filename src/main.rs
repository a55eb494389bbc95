use anyhow::{Result, bail};
use clap::{Arg, ArgMatches, Command};
use deepseek_code::config::{CredentialStore, Credentials, Model};
use deepseek_code::http_client::{HttpClient, ReqwestHttpClient};
use deepseek_code::operations::{self, DEFAULT_LANGUAGE, GenerateRequest, RefactorRequest};
use deepseek_code::remote_client::RemoteClient;
use deepseek_code::render;
use deepseek_code::session::Session;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const NO_CONFIG: &str = "No configuration found. Please run: deepseek config <apiKey>";

fn cli() -> Command {
    Command::new("deepseek")
        .about("AI-powered code assistant using the DeepSeek API")
        .long_about("Analyze, explain, generate and refactor code from the terminal. Run without arguments for an interactive session.")
        .subcommand(
            Command::new("config")
                .about("Set the API key and generation settings, or show the current configuration")
                .arg(Arg::new("api_key").help("DeepSeek API key").num_args(1))
                .arg(
                    Arg::new("model")
                        .short('m')
                        .long("model")
                        .help("Model to use")
                        .value_parser(Model::NAMES),
                )
                .arg(
                    Arg::new("temperature")
                        .long("temperature")
                        .help("Sampling temperature between 0 and 1")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    Arg::new("max-tokens")
                        .long("max-tokens")
                        .help("Maximum tokens per reply")
                        .value_parser(clap::value_parser!(u32)),
                ),
        )
        .subcommand(
            Command::new("analyze")
                .about("Analyze code for bugs and issues")
                .arg(Arg::new("file").required(true)),
        )
        .subcommand(
            Command::new("explain")
                .about("Explain what a piece of code does")
                .arg(Arg::new("file").required(true)),
        )
        .subcommand(
            Command::new("generate")
                .about("Generate code from a description")
                .arg(Arg::new("description").required(true).num_args(1..))
                .arg(
                    Arg::new("language")
                        .short('l')
                        .long("language")
                        .help("Target programming language")
                        .default_value(DEFAULT_LANGUAGE),
                )
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write the generated code to this file"),
                )
                .arg(
                    Arg::new("context")
                        .short('c')
                        .long("context")
                        .help("Additional context for the request"),
                ),
        )
        .subcommand(
            Command::new("refactor")
                .about("Refactor code for better quality")
                .arg(Arg::new("file").required(true))
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .help("Write the refactored code to this file"),
                )
                .arg(
                    Arg::new("goals")
                        .short('g')
                        .long("goals")
                        .help("What the refactoring should achieve"),
                ),
        )
        .subcommand(
            Command::new("interactive")
                .visible_alias("i")
                .about("Start an interactive session"),
        )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let matches = cli().get_matches();
    match run(matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = render::error(&mut io::stderr(), &e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn run(matches: ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("config", args)) => configure(args),
        Some((name @ ("analyze" | "explain" | "generate" | "refactor"), args)) => {
            one_shot(name, args).await
        }
        _ => interactive().await,
    }
}

fn path_arg(args: &ArgMatches, name: &str) -> PathBuf {
    args.get_one::<String>(name).map(PathBuf::from).unwrap_or_default()
}

/// Runs one non-interactive operation with the stored credentials.
async fn one_shot(name: &str, args: &ArgMatches) -> Result<()> {
    let Some(credentials) = CredentialStore::new()?.load() else {
        bail!(NO_CONFIG);
    };
    info!("Running {} with model {}", name, credentials.model());

    let http = ReqwestHttpClient::new();
    let client = RemoteClient::new(&http, &credentials);
    let mut out = io::stdout();

    match name {
        "analyze" => {
            operations::analyze(&client, &path_arg(args, "file"), &mut out).await?;
        }
        "explain" => {
            operations::explain(&client, &path_arg(args, "file"), &mut out).await?;
        }
        "generate" => {
            let request = GenerateRequest {
                description: args
                    .get_many::<String>("description")
                    .unwrap_or_default()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(" "),
                language: args
                    .get_one::<String>("language")
                    .cloned()
                    .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
                output: args.get_one::<String>("output").map(PathBuf::from),
                context: args.get_one::<String>("context").cloned(),
            };
            operations::generate(&client, &request, &mut out).await?;
        }
        "refactor" => {
            let request = RefactorRequest {
                file: path_arg(args, "file"),
                output: args.get_one::<String>("output").map(PathBuf::from),
                goals: args.get_one::<String>("goals").cloned(),
            };
            operations::refactor(&client, &request, &mut out).await?;
        }
        other => bail!("Unknown command: {}", other),
    }
    Ok(())
}

fn configure(args: &ArgMatches) -> Result<()> {
    let store = CredentialStore::new()?;
    let model = args.get_one::<String>("model").map(|m| m.parse::<Model>()).transpose()?;
    let temperature = args.get_one::<f64>("temperature").copied();
    let max_tokens = args.get_one::<u32>("max-tokens").copied();

    // Edits start from the persisted record so an environment key is never saved.
    let mut credentials = match args.get_one::<String>("api_key") {
        Some(api_key) => match store.load_stored() {
            Some(mut existing) => {
                existing.set_api_key(api_key.as_str())?;
                existing
            }
            None => Credentials::new(api_key.as_str())?,
        },
        None if model.is_none() && temperature.is_none() && max_tokens.is_none() => {
            store.describe(&mut io::stdout())?;
            return Ok(());
        }
        None => match store.load_stored() {
            Some(existing) => existing,
            None => bail!(NO_CONFIG),
        },
    };

    if let Some(model) = model {
        credentials.set_model(model);
    }
    if let Some(temperature) = temperature {
        credentials.set_temperature(temperature)?;
    }
    if let Some(max_tokens) = max_tokens {
        credentials.set_max_tokens(max_tokens)?;
    }

    store.save(&credentials)?;
    render::success(&mut io::stdout(), "Configuration saved successfully!")?;
    store.describe(&mut io::stdout())?;
    Ok(())
}

async fn interactive() -> Result<()> {
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n\n👋 Goodbye!\n");
            std::process::exit(0);
        }
    });

    let working_dir = std::env::current_dir()?;
    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new());
    let mut session = Session::new(
        working_dir,
        CredentialStore::new()?,
        http,
        io::stdin().lock(),
        io::stdout(),
    );

    let end = session.run().await?;
    info!("Interactive session finished: {:?}", end);
    Ok(())
}
