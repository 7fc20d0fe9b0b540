//! Info command - show configuration and server status.

use docullama_client::ClientConfig;

use crate::frontend::Frontend;

pub(crate) async fn run(config: ClientConfig) -> miette::Result<()> {
    let mut frontend = Frontend::connect(config);

    println!("DocuLlama");
    println!("=========");
    println!();
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Server:   {}", frontend.client.base_url());
    match frontend.client.check_health().await {
        Ok(()) => println!("  Reachable: yes"),
        Err(e) => println!("  Reachable: no ({})", e),
    }
    println!();

    let count = frontend.refresh_models().await.len();
    println!("Models:   {} available", count);
    match frontend.selected() {
        Some(model) => println!("Selected: {}", model.name),
        None => println!("Selected: (none)"),
    }
    println!();

    let template = &frontend.config.template;
    if template.is_empty() {
        println!("Template: (none)");
    } else {
        let first_line = template.lines().next().unwrap_or_default();
        println!("Template: {} chars", template.chars().count());
        println!("  {}", first_line);
    }

    Ok(())
}
