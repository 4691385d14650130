//! Stored data commands (history, show, delete, expenses)

use anyhow::{Context as _, Result};
use uuid::Uuid;

use super::analyze::{print_analysis, status_icon};
use super::{truncate, Context};

fn parse_id(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).with_context(|| format!("Invalid analysis ID: {}", id))
}

pub fn cmd_history(ctx: &Context, limit: usize) -> Result<()> {
    let store = ctx.open_store()?;
    let analyses = store.list_analyses()?;

    if analyses.is_empty() {
        println!("No analyses stored yet. Run 'expenseflow analyze' first.");
        return Ok(());
    }

    println!(
        "{:<36}  {:<16}  {:>12}  {:>4}  STATUS",
        "ID", "CREATED", "TOTAL", "DAYS"
    );
    println!("{}", "-".repeat(90));

    for analysis in analyses.iter().take(limit) {
        println!(
            "{:<36}  {:<16}  {:>12.2}  {:>4}  {} {}",
            analysis.id,
            analysis.created_at.format("%Y-%m-%d %H:%M"),
            analysis.total,
            analysis.days_analyzed,
            status_icon(analysis.budget_status),
            analysis.budget_status
        );
    }

    if analyses.len() > limit {
        println!();
        println!("({} more, use --limit to see them)", analyses.len() - limit);
    }
    Ok(())
}

pub fn cmd_show(ctx: &Context, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let store = ctx.open_store()?;
    let analysis = store.load_analysis(id)?;

    println!("Analysis {}", analysis.id);
    println!("Created {}", analysis.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
    print_analysis(&analysis);
    Ok(())
}

pub fn cmd_delete(ctx: &Context, id: &str) -> Result<()> {
    let id = parse_id(id)?;
    let store = ctx.open_store()?;
    store.delete_analysis(id)?;
    println!("✅ Deleted analysis {}", id);
    Ok(())
}

pub fn cmd_expenses(ctx: &Context, limit: usize) -> Result<()> {
    let store = ctx.open_store()?;
    let records = store.load_records()?;

    if records.is_empty() {
        println!("No expenses stored yet.");
        return Ok(());
    }

    println!(
        "{:<16}  {:<32}  {:>10}  {:<13}  SOURCE",
        "DATE", "DESCRIPTION", "AMOUNT", "CATEGORY"
    );
    println!("{}", "-".repeat(90));

    let skip = records.len().saturating_sub(limit);
    for record in records.iter().skip(skip) {
        let amount = if record.amount_unknown() {
            "?".to_string()
        } else {
            format!("{:.2}", record.amount)
        };
        println!(
            "{:<16}  {:<32}  {:>10}  {:<13}  {}",
            record.created_at.format("%Y-%m-%d %H:%M"),
            truncate(&record.description, 32),
            amount,
            record.category.as_str(),
            record.source.as_str()
        );
    }

    println!();
    println!("Showing {} of {} records", records.len() - skip, records.len());
    Ok(())
}
