//! Chat command - interactive prompt loop.
//!
//! Each submitted line is one prompt. A trailing `\` continues the prompt
//! on the next line. Ctrl-C stops a running generation, or exits when idle.

use std::io::Write;
use std::path::PathBuf;

use docullama_client::{read_template, ClientConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::models::print_models;
use crate::frontend::Frontend;

/// A `:` command typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatCommand {
    Help,
    Quit,
    Models,
    Model(String),
    Url(String),
    ShowTemplate,
    LoadTemplate(PathBuf),
    Clear,
    Response,
    Status,
}

impl ChatCommand {
    /// Parse a line starting with `:`.
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let body = line.strip_prefix(':').unwrap_or(line);
        let (name, arg) = match body.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (body, ""),
        };

        match (name, arg.is_empty()) {
            ("help" | "h" | "?", true) => Ok(ChatCommand::Help),
            ("quit" | "q" | "exit", true) => Ok(ChatCommand::Quit),
            ("models", true) => Ok(ChatCommand::Models),
            ("model", false) => Ok(ChatCommand::Model(arg.to_string())),
            ("url", false) => Ok(ChatCommand::Url(arg.to_string())),
            ("template", true) => Ok(ChatCommand::ShowTemplate),
            ("template", false) => Ok(ChatCommand::LoadTemplate(PathBuf::from(arg))),
            ("clear", true) => Ok(ChatCommand::Clear),
            ("response", true) => Ok(ChatCommand::Response),
            ("status", true) => Ok(ChatCommand::Status),
            ("model", true) => Err("usage: :model NAME".to_string()),
            ("url", true) => Err("usage: :url URL".to_string()),
            _ => Err(format!("unknown command '{}', try :help", line)),
        }
    }
}

const HELP: &str = "\
Commands:
  :models          refresh and list models
  :model NAME      select a model
  :url URL         switch to another server
  :template        show the instruction template
  :template FILE   load the instruction template from a file
  :clear           clear the last response
  :response        print the last response again
  :status          show what is selected
  :quit            exit

End a line with \\ to continue the prompt on the next line.
Ctrl-C stops a running generation.";

pub(crate) async fn run(config: ClientConfig) -> miette::Result<()> {
    let mut frontend = Frontend::connect(config);

    println!("DocuLlama chat on {}. Type :help for commands.", frontend.config.base_url);
    if frontend.refresh_models().await.is_empty() && frontend.selected().is_none() {
        println!("No models available yet; try :models once the server is up.");
    } else if let Some(model) = frontend.selected() {
        println!("Using model {}.", model.name);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = String::new();

    loop {
        print!("{}", if pending.is_empty() { "> " } else { ". " });
        std::io::stdout().flush().ok();

        let line = tokio::select! {
            line = lines.next_line() => {
                line.map_err(|e| miette::miette!("Failed to read input: {}", e))?
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        let Some(line) = line else {
            println!();
            break;
        };

        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head);
            pending.push('\n');
            continue;
        }

        if pending.is_empty() && line.trim_start().starts_with(':') {
            match ChatCommand::parse(&line) {
                Ok(ChatCommand::Quit) => break,
                Ok(command) => execute(&mut frontend, command).await,
                Err(message) => println!("{}", message),
            }
            continue;
        }

        pending.push_str(&line);
        let prompt = std::mem::take(&mut pending);
        if prompt.trim().is_empty() {
            continue;
        }

        if frontend.ask(&prompt).await.is_some() {
            println!();
        } else if frontend.selected().is_none() {
            println!("No model selected; use :models and :model NAME.");
        }
    }

    Ok(())
}

async fn execute(frontend: &mut Frontend, command: ChatCommand) {
    match command {
        ChatCommand::Help => println!("{}", HELP),
        ChatCommand::Quit => {}
        ChatCommand::Models => {
            frontend.refresh_models().await;
            print_models(frontend);
        }
        ChatCommand::Model(name) => {
            if frontend.directory.select(&name) {
                println!("Using model {}.", name);
            } else {
                println!("Unknown model '{}'; :models lists what the server has.", name);
            }
        }
        ChatCommand::Url(url) => {
            frontend.switch_server(&url);
            let count = frontend.refresh_models().await.len();
            println!("Server {}: {} models.", frontend.config.base_url, count);
        }
        ChatCommand::ShowTemplate => {
            if frontend.config.template.is_empty() {
                println!("(no template)");
            } else {
                println!("{}", frontend.config.template);
            }
        }
        ChatCommand::LoadTemplate(path) => match read_template(&path) {
            Ok(template) => {
                println!("Loaded template from {} ({} chars).", path.display(), template.chars().count());
                frontend.config.template = template;
            }
            Err(e) => println!("Could not read {}: {}", path.display(), e),
        },
        ChatCommand::Clear => {
            frontend.session.clear();
        }
        ChatCommand::Response => println!("{}", frontend.session.response()),
        ChatCommand::Status => {
            let state = if frontend.session.is_streaming() { "Generating..." } else { "Ready" };
            let model = frontend.selected().map(|m| m.name.as_str()).unwrap_or("(none)");
            println!("{} | server {} | model {}", state, frontend.config.base_url, model);
            let dropped = frontend.session.state().dropped_lines;
            if dropped > 0 {
                println!("Last response skipped {} undecodable line(s).", dropped);
            }
        }
    }
}
