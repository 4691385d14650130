//! ExpenseFlow CLI - expense notes in, budget guidance out
//!
//! Usage:
//!   expenseflow analyze "kahve 50 TL" "laptop" --income 15000 --days 7
//!   expenseflow history            List stored analyses
//!   expenseflow route              Show task → model routing
//!   expenseflow backends           Check inference/search backends

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging on stderr so stdout stays clean for --json
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();

    let ctx = commands::Context::new(cli.data_dir, cli.config_dir);

    match cli.command {
        Commands::Analyze {
            texts,
            file,
            income,
            days,
            no_search,
            strategy,
            threshold,
            json,
            no_save,
        } => {
            let args = commands::AnalyzeArgs {
                texts,
                file,
                income,
                days,
                no_search,
                strategy,
                threshold,
                json,
                no_save,
            };
            commands::cmd_analyze(&ctx, args).await
        }
        Commands::History { limit } => commands::cmd_history(&ctx, limit),
        Commands::Show { id } => commands::cmd_show(&ctx, &id),
        Commands::Delete { id } => commands::cmd_delete(&ctx, &id),
        Commands::Expenses { limit } => commands::cmd_expenses(&ctx, limit),
        Commands::Route { strategy } => commands::cmd_route(&ctx, strategy.as_deref()),
        Commands::Prompts { action } => match action {
            PromptsAction::List => commands::cmd_prompts_list(&ctx),
            PromptsAction::Show { id } => commands::cmd_prompts_show(&ctx, &id),
        },
        Commands::Backends => commands::cmd_backends().await,
    }
}
