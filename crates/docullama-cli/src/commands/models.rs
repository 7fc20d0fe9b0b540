//! Models command - list what the server can run.

use docullama_client::{ClientConfig, ModelDescriptor};

use crate::frontend::Frontend;

pub(crate) async fn run(config: ClientConfig, json: bool) -> miette::Result<()> {
    let mut frontend = Frontend::connect(config);
    frontend.refresh_models().await;

    if json {
        let listing = serde_json::to_string_pretty(frontend.directory.available())
            .map_err(|e| miette::miette!("Failed to encode model list: {}", e))?;
        println!("{}", listing);
        return Ok(());
    }

    print_models(&frontend);
    Ok(())
}

/// Print the model list, marking the selection.
pub(crate) fn print_models(frontend: &Frontend) {
    let models = frontend.directory.available();

    if models.is_empty() {
        println!("No models available from {}.", frontend.config.base_url);
        println!();
        println!("Make sure the server is running and has a model, e.g.:");
        println!("  ollama serve");
        println!("  ollama pull llama3.2");
        return;
    }

    println!("Models on {}:", frontend.config.base_url);
    for model in models {
        println!("{}", format_entry(model, frontend.selected()));
    }
}

fn format_entry(model: &ModelDescriptor, selected: Option<&ModelDescriptor>) -> String {
    let marker = if selected == Some(model) { '*' } else { ' ' };
    if model.model == model.name {
        format!("{} {}", marker, model.name)
    } else {
        format!("{} {} ({})", marker, model.name, model.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_entry_marked() {
        let model = ModelDescriptor::named("llama3.2:latest");
        assert_eq!(format_entry(&model, Some(&model)), "* llama3.2:latest");
        assert_eq!(format_entry(&model, None), "  llama3.2:latest");
    }

    #[test]
    fn test_entry_shows_distinct_tag() {
        let model = ModelDescriptor::new("coder", "qwen2.5-coder:7b");
        assert_eq!(format_entry(&model, None), "  coder (qwen2.5-coder:7b)");
    }
}
