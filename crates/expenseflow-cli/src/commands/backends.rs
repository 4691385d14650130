//! Backends command: health-check inference and search

use anyhow::Result;
use expenseflow_core::{AIClient, SearchBackend, SearchClient};

pub async fn cmd_backends() -> Result<()> {
    println!("🔍 Checking backends...\n");

    match AIClient::from_env() {
        Some(client) => {
            let info = client.info().await;
            let status = if info.healthy { "✅ Connected" } else { "❌ Unreachable" };
            println!("  Inference: {} at {} {}", info.name, info.host, status);
        }
        None => {
            println!("  Inference: not configured");
            println!("    Set OLLAMA_HOST (or AI_BACKEND=openai_compatible with OPENAI_COMPATIBLE_HOST)");
            println!("    Without it, notes need an amount like \"kahve 50 TL\" and guidance uses templates");
        }
    }

    match SearchClient::from_env() {
        Some(client) => {
            let status = if client.health_check().await {
                "✅ Reachable"
            } else {
                "❌ Unreachable"
            };
            println!("  Search:    {} {}", client.name(), status);
        }
        None => println!("  Search:    disabled (SEARCH_BACKEND=none)"),
    }

    println!();
    Ok(())
}
