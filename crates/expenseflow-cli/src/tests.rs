//! CLI command tests
//!
//! This module contains all tests for the CLI commands. Every test uses
//! temporary data and config directories so nothing touches the real ones.

use std::fs;

use expenseflow_core::{
    AIClient, BudgetStatus, ExtractionSource, GuidanceSource, JsonFileStore, MockBackend,
    MockSearch, PipelineReport, SearchClient, SearchHit,
};
use tempfile::TempDir;

use crate::commands::{self, truncate, AnalyzeArgs, Context};

struct TestEnv {
    data: TempDir,
    config: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            data: TempDir::new().unwrap(),
            config: TempDir::new().unwrap(),
        }
    }

    fn ctx(&self) -> Context {
        Context::new(
            Some(self.data.path().to_path_buf()),
            Some(self.config.path().to_path_buf()),
        )
    }

    fn store(&self) -> JsonFileStore {
        JsonFileStore::new(self.data.path()).unwrap()
    }
}

fn args(texts: &[&str]) -> AnalyzeArgs {
    AnalyzeArgs {
        texts: texts.iter().map(|s| s.to_string()).collect(),
        days: 1,
        ..Default::default()
    }
}

fn mock_ai() -> Option<AIClient> {
    Some(AIClient::Mock(MockBackend::new()))
}

fn mock_search(search: MockSearch) -> Option<SearchClient> {
    Some(SearchClient::Mock(search))
}

// ========== Helpers ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("kahve", 10), "kahve");
    assert_eq!(truncate("market alışverişi", 10), "market ...");
    assert_eq!(truncate("çççççççççç", 10), "çççççççççç");
}

#[test]
fn test_read_notes_skips_blanks_and_comments() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("notes.txt");
    fs::write(&path, "# week 12\nkahve 50 TL\n\n  taksi 120 TL  \n# done\n").unwrap();

    let notes = commands::read_notes(&path).unwrap();
    assert_eq!(notes, vec!["kahve 50 TL", "taksi 120 TL"]);

    assert!(commands::read_notes(&dir.path().join("missing.txt")).is_err());
}

#[test]
fn test_parse_strategy() {
    assert!(commands::parse_strategy("auto").is_ok());
    assert!(commands::parse_strategy("forced-fast").is_ok());
    assert!(commands::parse_strategy("fastest").is_err());
}

// ========== Analyze Command Tests ==========

#[tokio::test]
async fn test_analyze_saves_snapshots() {
    let env = TestEnv::new();
    let search = MockSearch::new().with_results(
        "laptop",
        vec![SearchHit::new("Laptop", "https://example.com", "25.000 TL")],
    );

    let mut request = args(&["kahve 50 TL", "market alışverişi 300 TL", "laptop"]);
    request.income = Some(15000.0);
    request.days = 7;

    let report = commands::run_analyze(&env.ctx(), request, mock_ai(), mock_search(search))
        .await
        .unwrap();

    assert_eq!(report.records.len(), 3);
    assert_eq!(report.analysis.budget_status, BudgetStatus::Healthy);
    assert!(report.records[2].is_searched());

    let store = env.store();
    assert_eq!(store.load_records().unwrap().len(), 3);
    assert_eq!(
        store.load_analysis(report.analysis.id).unwrap(),
        report.analysis
    );
}

#[tokio::test]
async fn test_analyze_no_save() {
    let env = TestEnv::new();
    let mut request = args(&["kahve 50 TL"]);
    request.no_save = true;

    commands::run_analyze(&env.ctx(), request, mock_ai(), None)
        .await
        .unwrap();

    assert!(!env.data.path().join("expenses.json").exists());
}

#[tokio::test]
async fn test_json_output_is_only_json() {
    let env = TestEnv::new();
    let mut request = args(&["kahve 50 TL"]);
    request.json = true;
    request.no_save = true;

    let report = commands::run_analyze(&env.ctx(), request, None, None)
        .await
        .unwrap();
    let mut out = Vec::new();
    commands::write_json(&mut out, &report).unwrap();

    let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(value["analysis"]["budget_status"], "UNKNOWN");
    assert_eq!(value["records"][0]["amount"], 50.0);

    let parsed: PipelineReport = serde_json::from_slice(&out).unwrap();
    assert_eq!(parsed.analysis.id, report.analysis.id);
}

#[tokio::test]
async fn test_analyze_reads_file_and_args() {
    let env = TestEnv::new();
    let path = env.config.path().join("week.txt");
    fs::write(&path, "taksi 120 TL\nsimit 15 TL\n").unwrap();

    let mut request = args(&["kahve 50 TL"]);
    request.file = Some(path);
    request.no_save = true;

    let report = commands::run_analyze(&env.ctx(), request, mock_ai(), None)
        .await
        .unwrap();
    let texts: Vec<_> = report.records.iter().map(|r| r.original_text.as_str()).collect();
    assert_eq!(texts, vec!["kahve 50 TL", "taksi 120 TL", "simit 15 TL"]);
}

#[tokio::test]
async fn test_analyze_without_backends_degrades() {
    let env = TestEnv::new();
    let mut request = args(&["kahve 50 TL", "laptop"]);
    request.income = Some(1000.0);
    request.no_save = true;

    let report = commands::run_analyze(&env.ctx(), request, None, None)
        .await
        .unwrap();

    assert_eq!(report.records[1].source, ExtractionSource::Fallback);
    assert_eq!(report.guidance.source, GuidanceSource::Template);
    assert!(!report.guidance.action_items.is_empty());
}

#[tokio::test]
async fn test_analyze_rejects_bad_input() {
    let env = TestEnv::new();
    let ctx = env.ctx();

    assert!(commands::run_analyze(&ctx, args(&[]), mock_ai(), None)
        .await
        .is_err());

    let mut zero_days = args(&["kahve 50 TL"]);
    zero_days.days = 0;
    assert!(commands::run_analyze(&ctx, zero_days, mock_ai(), None)
        .await
        .is_err());

    let mut bad_threshold = args(&["kahve 50 TL"]);
    bad_threshold.threshold = Some(-1.0);
    assert!(commands::run_analyze(&ctx, bad_threshold, mock_ai(), None)
        .await
        .is_err());

    let mut bad_strategy = args(&["kahve 50 TL"]);
    bad_strategy.strategy = Some("fastest".to_string());
    assert!(commands::run_analyze(&ctx, bad_strategy, mock_ai(), None)
        .await
        .is_err());
}

#[tokio::test]
async fn test_threshold_from_config_dir_and_flag() {
    let env = TestEnv::new();
    fs::write(
        env.config.path().join("pipeline.toml"),
        "[enrichment]\nthreshold = 1000.0\n",
    )
    .unwrap();
    let hits = vec![SearchHit::new("Market", "https://example.com", "...")];

    // Config raises the threshold above 300
    let search = MockSearch::new().with_results("market", hits.clone());
    let mut request = args(&["market 300 TL"]);
    request.no_save = true;
    let report = commands::run_analyze(&env.ctx(), request, mock_ai(), mock_search(search.clone()))
        .await
        .unwrap();
    assert_eq!(search.call_count(), 0);
    assert!(!report.records[0].is_searched());

    // The flag wins over the config file
    let search = MockSearch::new().with_results("market", hits);
    let mut request = args(&["market 300 TL"]);
    request.no_save = true;
    request.threshold = Some(200.0);
    let report = commands::run_analyze(&env.ctx(), request, mock_ai(), mock_search(search.clone()))
        .await
        .unwrap();
    assert_eq!(search.call_count(), 1);
    assert!(report.records[0].is_searched());
}

#[tokio::test]
async fn test_no_search_flag_skips_enrichment() {
    let env = TestEnv::new();
    let search = MockSearch::new();
    let mut request = args(&["kira 20000 TL"]);
    request.no_search = true;
    request.no_save = true;

    commands::run_analyze(&env.ctx(), request, mock_ai(), mock_search(search.clone()))
        .await
        .unwrap();
    assert_eq!(search.call_count(), 0);
}

#[tokio::test]
async fn test_analyze_over_ollama_http() {
    use expenseflow_core::test_utils::MockOllamaServer;

    let env = TestEnv::new();
    let server = MockOllamaServer::start().await;
    let mut request = args(&["kulaklık"]);
    request.no_save = true;

    let report = commands::run_analyze(
        &env.ctx(),
        request,
        Some(AIClient::ollama(&server.url())),
        None,
    )
    .await
    .unwrap();

    assert_eq!(report.records[0].amount, 1500.0);
    assert_eq!(report.guidance.source, GuidanceSource::Inference);
    assert_eq!(server.models_used().len(), 2);
}

// ========== History Command Tests ==========

#[tokio::test]
async fn test_history_show_delete() {
    let env = TestEnv::new();
    let ctx = env.ctx();

    // Empty store is fine
    assert!(commands::cmd_history(&ctx, 10).is_ok());
    assert!(commands::cmd_expenses(&ctx, 10).is_ok());

    let report = commands::run_analyze(&ctx, args(&["kahve 50 TL"]), mock_ai(), None)
        .await
        .unwrap();
    let id = report.analysis.id.to_string();

    assert!(commands::cmd_history(&ctx, 10).is_ok());
    assert!(commands::cmd_expenses(&ctx, 1).is_ok());
    assert!(commands::cmd_show(&ctx, &id).is_ok());

    assert!(commands::cmd_delete(&ctx, &id).is_ok());
    assert!(commands::cmd_show(&ctx, &id).is_err());
    assert!(commands::cmd_delete(&ctx, &id).is_err());
}

#[test]
fn test_show_rejects_invalid_id() {
    let env = TestEnv::new();
    let result = commands::cmd_show(&env.ctx(), "not-a-uuid");
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("Invalid analysis ID"));
}

// ========== Route / Prompts Command Tests ==========

#[test]
fn test_cmd_route() {
    let env = TestEnv::new();
    assert!(commands::cmd_route(&env.ctx(), None).is_ok());
    assert!(commands::cmd_route(&env.ctx(), Some("accurate")).is_ok());
    assert!(commands::cmd_route(&env.ctx(), Some("nope")).is_err());
}

#[test]
fn test_cmd_route_reads_models_toml() {
    let env = TestEnv::new();
    fs::write(
        env.config.path().join("models.toml"),
        "[backends.fast]\nmodel = \"qwen2.5:1.5b\"\n",
    )
    .unwrap();

    let router = env.ctx().router(None).unwrap();
    assert_eq!(
        router.model_for_task(expenseflow_core::TaskCategory::Extract),
        "qwen2.5:1.5b"
    );
    assert!(commands::cmd_route(&env.ctx(), None).is_ok());
}

#[test]
fn test_cmd_prompts() {
    let env = TestEnv::new();
    let ctx = env.ctx();

    assert!(commands::cmd_prompts_list(&ctx).is_ok());
    assert!(commands::cmd_prompts_show(&ctx, "parse_expense").is_ok());
    assert!(commands::cmd_prompts_show(&ctx, "recommend_strategy").is_ok());

    let err = commands::cmd_prompts_show(&ctx, "classify_merchant").unwrap_err();
    assert!(err.to_string().contains("parse_expense"));
}

#[test]
fn test_prompt_override_from_config_dir() {
    let env = TestEnv::new();
    let prompts_dir = env.config.path().join("prompts");
    fs::create_dir_all(&prompts_dir).unwrap();
    fs::write(
        prompts_dir.join("parse_expense.md"),
        "---\nid: parse_expense\nversion: 2\ntask_type: extract\n---\n\n# User\nNote: {{text}}\n",
    )
    .unwrap();

    let ctx = env.ctx();
    let mut library = ctx.prompt_library();
    let prompt = library.get(expenseflow_core::PromptId::ParseExpense).unwrap();
    assert!(prompt.is_override);
    assert_eq!(prompt.metadata.version, 2);
    assert!(commands::cmd_prompts_list(&ctx).is_ok());
}
