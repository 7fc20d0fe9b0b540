//! DocuLlama CLI - prompt a local Ollama server from the terminal.

use clap::{Args, Parser, Subcommand};
use docullama_client::ClientConfig;
use std::path::PathBuf;

mod commands;
mod frontend;

/// DocuLlama - send a templated prompt to a local model and watch the answer stream in
#[derive(Parser)]
#[command(name = "docullama")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    server: ServerArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Overrides for the environment configuration.
#[derive(Args)]
struct ServerArgs {
    /// Inference server URL (default: $DOCULLAMA_URL or http://127.0.0.1:11434)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Model to use (default: first model the server lists)
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Instruction template text placed before every prompt
    #[arg(long, global = true, conflicts_with_all = ["template_file", "no_template"])]
    template: Option<String>,

    /// Read the instruction template from a file
    #[arg(long, global = true, conflicts_with = "no_template")]
    template_file: Option<PathBuf>,

    /// Send prompts without any instruction template
    #[arg(long, global = true)]
    no_template: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the models available on the server
    Models {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Send one prompt and stream the response to stdout
    Ask {
        /// Prompt text; read from stdin when omitted or "-"
        prompt: Option<String>,
    },

    /// Interactive prompt loop
    Chat,

    /// Show the effective configuration and server status
    Info,
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();

    // Set up logging; stdout is reserved for streamed text
    let filter = if cli.verbose { "debug" } else { "warn" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let config = load_config(&cli.server)?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| miette::miette!("Failed to start async runtime: {}", e))?;

    runtime.block_on(async move {
        match cli.command {
            Commands::Models { json } => commands::models::run(config, json).await,
            Commands::Ask { prompt } => commands::ask::run(config, prompt.as_deref()).await,
            Commands::Chat => commands::chat::run(config).await,
            Commands::Info => commands::info::run(config).await,
        }
    })
}

/// Environment configuration with command-line overrides applied.
fn load_config(args: &ServerArgs) -> miette::Result<ClientConfig> {
    let env = ClientConfig::from_env()
        .map_err(|e| miette::miette!("Failed to load configuration: {}", e))?;

    let mut builder = ClientConfig::builder()
        .base_url(args.url.as_deref().unwrap_or(&env.base_url))
        .template(env.template);

    if let Some(model) = args.model.clone().or(env.model) {
        builder = builder.model(model);
    }

    if args.no_template {
        builder = builder.template("");
    } else if let Some(path) = &args.template_file {
        builder = builder
            .template_file(path)
            .map_err(|e| miette::miette!("Failed to read template {}: {}", path.display(), e))?;
    } else if let Some(template) = &args.template {
        builder = builder.template(template.clone());
    }

    Ok(builder.build())
}
