//! Prompts-related command implementations

use anyhow::{anyhow, Result};
use expenseflow_core::PromptId;

use super::Context;

/// List all available prompts and their override status
pub fn cmd_prompts_list(ctx: &Context) -> Result<()> {
    let mut library = ctx.prompt_library();
    let prompts = library.list();

    println!("Available Prompts:\n");

    println!(
        "{:<25} {:>7}  {:<12}  {}",
        "ID", "VERSION", "TASK TYPE", "OVERRIDE"
    );
    println!("{}", "-".repeat(60));

    for info in prompts {
        let override_status = if info.has_override {
            "✓ Custom"
        } else {
            "Default"
        };

        println!(
            "{:<25} {:>7}  {:<12}  {}",
            info.id, info.version, info.task_type, override_status
        );
    }

    println!();
    println!(
        "Override directory: {}",
        ctx.prompts_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not available)".to_string())
    );

    println!();
    println!("To customize a prompt:");
    println!("  1. Copy the default to the override directory as <id>.md");
    println!("  2. Edit the file with your changes");
    println!("  3. Run the next analysis; overrides are read on startup");

    Ok(())
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(ctx: &Context, prompt_id: &str) -> Result<()> {
    let id: PromptId = prompt_id.parse().map_err(|e: String| {
        let available: Vec<_> = PromptId::all().iter().map(|id| id.as_str()).collect();
        anyhow!("{} (available: {})", e, available.join(", "))
    })?;

    let mut library = ctx.prompt_library();
    let prompt = library.get(id)?;

    println!("Prompt: {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    println!("Task Type: {}", prompt.metadata.task_type);
    if let Some(temperature) = prompt.metadata.temperature {
        println!("Temperature: {}", temperature);
    }
    println!(
        "Source: {}",
        if prompt.is_override {
            "Override"
        } else {
            "Default"
        }
    );

    if let Some(ref path) = prompt.override_path {
        println!("Override Path: {}", path.display());
    }

    println!();
    println!("--- Content ---");
    println!("{}", prompt.content);

    Ok(())
}
