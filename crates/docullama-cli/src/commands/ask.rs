//! Ask command - send a single prompt.

use std::io::Read;

use docullama_client::ClientConfig;

use crate::frontend::{Frontend, Outcome};

pub(crate) async fn run(config: ClientConfig, prompt: Option<&str>) -> miette::Result<()> {
    let prompt = match prompt {
        Some(text) if text != "-" => text.to_string(),
        _ => read_stdin()?,
    };
    if prompt.is_empty() {
        return Err(miette::miette!("Nothing to send: the prompt is empty"));
    }

    let mut frontend = Frontend::connect(config);
    frontend.refresh_models().await;

    if frontend.selected().is_none() {
        return Err(miette::miette!(
            "No model selected and none available from {}. Pass --model or run: ollama pull <model>",
            frontend.config.base_url
        ));
    }

    match frontend.ask(&prompt).await {
        Some(Outcome::Completed) => {
            println!();
            Ok(())
        }
        Some(Outcome::Cancelled) => Err(miette::miette!("Generation cancelled")),
        None => Err(miette::miette!("Prompt was not sent")),
    }
}

fn read_stdin() -> miette::Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .map_err(|e| miette::miette!("Failed to read prompt from stdin: {}", e))?;
    Ok(input)
}
