//! Analyze command: run the pipeline on expense notes

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use expenseflow_core::{
    AIClient, AnalysisResult, AnalyzeRequest, BudgetStatus, GuidanceSource, InferenceClient,
    PipelineCoordinator, PipelineReport, SearchClient,
};

use super::{truncate, Context};

/// Options for `expenseflow analyze`
#[derive(Debug, Clone, Default)]
pub struct AnalyzeArgs {
    pub texts: Vec<String>,
    pub file: Option<PathBuf>,
    pub income: Option<f64>,
    pub days: u32,
    pub no_search: bool,
    pub strategy: Option<String>,
    pub threshold: Option<f64>,
    pub json: bool,
    pub no_save: bool,
}

pub async fn cmd_analyze(ctx: &Context, args: AnalyzeArgs) -> Result<()> {
    let ai = AIClient::from_env();
    if ai.is_none() {
        eprintln!("💡 Tip: Set OLLAMA_HOST to parse free-form notes and get AI guidance");
    }
    let search = if args.no_search {
        None
    } else {
        SearchClient::from_env()
    };

    let json = args.json;
    let report = run_analyze(ctx, args, ai, search).await?;

    if json {
        write_json(&mut std::io::stdout().lock(), &report)?;
    } else {
        print_report(&report);
    }
    Ok(())
}

/// Build the pipeline from config plus the given backends and run it
pub async fn run_analyze(
    ctx: &Context,
    args: AnalyzeArgs,
    ai: Option<AIClient>,
    search: Option<SearchClient>,
) -> Result<PipelineReport> {
    let mut texts = args.texts;
    if let Some(ref path) = args.file {
        texts.extend(read_notes(path)?);
    }
    if texts.is_empty() {
        bail!("No expense notes given. Pass them as arguments or with --file");
    }

    let router = Arc::new(ctx.router(args.strategy.as_deref())?);
    let mut config = ctx.pipeline_config()?;
    if let Some(threshold) = args.threshold {
        if !threshold.is_finite() || threshold < 0.0 {
            bail!("--threshold must be a non-negative number");
        }
        config.enrichment.threshold = threshold;
    }
    if args.no_save {
        config.storage.enabled = false;
    }

    let inference = InferenceClient::new(ai, router, ctx.prompt_library())
        .context("Failed to load prompts")?;
    let mut coordinator = PipelineCoordinator::new(Arc::new(inference), search, config)?;
    if !args.no_save {
        coordinator = coordinator.with_store(Arc::new(ctx.open_store()?));
    }

    let mut request = AnalyzeRequest::new(texts)
        .with_days(args.days)
        .with_enrichment(!args.no_search);
    request.income = args.income;

    let report = coordinator.run(request).await?;
    Ok(report)
}

/// Write the report as pretty JSON. Nothing else goes to this writer, so
/// `--json` output can be piped straight into other tools.
pub fn write_json(out: &mut impl Write, report: &PipelineReport) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

/// Notes from a file: one per line, blank lines and `#` comments skipped
pub fn read_notes(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

pub fn status_icon(status: BudgetStatus) -> &'static str {
    match status {
        BudgetStatus::Healthy => "✅",
        BudgetStatus::Warning => "⚠️ ",
        BudgetStatus::OverBudget => "🚨",
        BudgetStatus::Unknown => "❔",
    }
}

fn print_report(report: &PipelineReport) {
    println!();
    println!("🧾 Expenses ({})", report.records.len());
    println!("   ─────────────────────────────────────────────────────────────");
    for record in &report.records {
        let amount = if record.amount_unknown() {
            "?".to_string()
        } else {
            format!("{:.2}", record.amount)
        };
        let searched = if record.is_searched() { " 🔎" } else { "" };
        println!(
            "   {:<32} {:>10} TL  {:<13}{}",
            truncate(&record.description, 32),
            amount,
            record.category.as_str(),
            searched
        );
    }

    print_analysis(&report.analysis);

    let guidance = &report.guidance;
    println!();
    match guidance.source {
        GuidanceSource::Inference => println!("💬 Guidance"),
        GuidanceSource::Template => println!("💬 Guidance (template)"),
    }
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   {}", guidance.summary);
    if !guidance.recommendations.is_empty() {
        println!();
        for (i, rec) in guidance.recommendations.iter().enumerate() {
            println!("   {}. {}", i + 1, rec);
        }
    }

    println!();
    println!("🎯 Actions");
    for action in &guidance.action_items {
        match action.potential_savings {
            Some(savings) => println!(
                "   [{:<6}] {} (save ~{:.0} TL)",
                action.priority.as_str(),
                action.description,
                savings
            ),
            None => println!(
                "   [{:<6}] {}",
                action.priority.as_str(),
                action.description
            ),
        }
    }

    println!();
    println!("📌 Goals");
    for goal in &guidance.goals {
        println!(
            "   {} ({:.0} → {:.0}, {})",
            goal.description, goal.current_value, goal.target_value, goal.timeframe
        );
    }

    println!();
    println!(
        "   Analysis {} · {} ms",
        report.analysis.id, report.processing_time_ms
    );
}

/// Print the numbers of an analysis (shared with `show`)
pub fn print_analysis(analysis: &AnalysisResult) {
    println!();
    println!(
        "📊 Analysis ({} day{})",
        analysis.days_analyzed,
        if analysis.days_analyzed == 1 { "" } else { "s" }
    );
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Total:              {:>12.2} TL", analysis.total);
    println!("   Daily average:      {:>12.2} TL", analysis.daily_rate);
    println!("   Monthly projection: {:>12.2} TL", analysis.monthly_projection);
    if let Some(income) = analysis.income {
        println!("   Monthly income:     {:>12.2} TL", income);
    }
    if let Some(remaining) = analysis.remaining_budget {
        println!("   Remaining budget:   {:>12.2} TL", remaining);
    }
    match analysis.usage_percentage {
        Some(usage) => println!(
            "   Status:             {} {} ({:.1}% of income)",
            status_icon(analysis.budget_status),
            analysis.budget_status,
            usage
        ),
        None => println!(
            "   Status:             {} {} (no income given)",
            status_icon(analysis.budget_status),
            analysis.budget_status
        ),
    }

    if !analysis.category_breakdown.is_empty() {
        println!();
        let mut categories: Vec<_> = analysis.category_breakdown.iter().collect();
        categories.sort_by(|a, b| b.1.total_cmp(a.1));
        for (category, amount) in categories {
            println!(
                "   {:<14} {:>10.2} TL  {:>5.1}%",
                category.as_str(),
                amount,
                analysis.share_of(*category)
            );
        }
    }

    if !analysis.trends.is_empty() {
        println!();
        for trend in &analysis.trends {
            println!("   📈 {}", trend);
        }
    }
}
