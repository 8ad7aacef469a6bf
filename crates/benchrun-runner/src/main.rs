//! BenchRun - overnight SWE-bench baseline runner.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use benchrun_core::{ModelFilter, ModelKey, ModelRegistry, RunId, Tier};
use benchrun_runner::json_output;
use benchrun_runner::{
    generate_baseline, load_problems, Config, JobRunner, Orchestrator, ProbeMode, Prober,
    ResultStore, RunSummary,
};

/// Log filter used when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "benchrun=info";

/// Seconds to wait before a run starts, so it can be cancelled.
const GRACE_PERIOD_SECS: u64 = 5;

/// BenchRun - run language models against SWE-bench and submit the results
#[derive(Parser)]
#[command(name = "benchrun")]
#[command(about = "Benchmark LLMs on SWE-bench via OpenRouter and sb-cli", long_about = None)]
struct Cli {
    /// Emit JSON-lines progress events on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every selected model, save predictions and submit them
    Run {
        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        batch: BatchArgs,

        #[command(flatten)]
        submit: SubmitArgs,

        /// Save predictions without submitting them
        #[arg(long)]
        no_submit: bool,

        /// Start immediately, without the cancellation grace period
        #[arg(short, long)]
        yes: bool,
    },

    /// Generate predictions for a single model, without submitting
    Generate {
        /// Model key (see `benchrun models`)
        key: String,

        /// JSON model catalog replacing the built-in one
        #[arg(long)]
        models: Option<PathBuf>,

        #[command(flatten)]
        gateway: GatewayArgs,

        #[command(flatten)]
        batch: BatchArgs,
    },

    /// Submit an existing predictions file
    Submit {
        /// Predictions file (JSON-Lines)
        predictions: PathBuf,

        /// Evaluation run identifier (defaults to the file stem)
        #[arg(long)]
        run_id: Option<String>,

        #[command(flatten)]
        submit: SubmitArgs,
    },

    /// List the model catalog grouped by provider
    Models {
        #[command(flatten)]
        models: ModelArgs,
    },

    /// Send a short request to each selected model
    Probe {
        #[command(flatten)]
        models: ModelArgs,

        #[command(flatten)]
        gateway: GatewayArgs,

        /// Probe only the budget tier with a one-word prompt
        #[arg(long)]
        quick: bool,
    },
}

#[derive(Args)]
struct ModelArgs {
    /// JSON model catalog replacing the built-in one
    #[arg(long)]
    models: Option<PathBuf>,

    /// Model keys to include (comma separated or repeated)
    #[arg(long = "model", value_delimiter = ',')]
    keys: Vec<String>,

    /// Only models of this tier (best, budget)
    #[arg(long)]
    tier: Option<Tier>,

    /// Only models from this provider
    #[arg(long)]
    provider: Option<String>,

    /// Include models marked unavailable
    #[arg(long)]
    include_unavailable: bool,
}

#[derive(Args)]
struct GatewayArgs {
    /// OpenRouter API key
    #[arg(long, env = "OPENROUTER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Completion API base URL
    #[arg(long, default_value = benchrun_gateway::DEFAULT_BASE_URL)]
    base_url: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 600)]
    request_timeout_secs: u64,
}

#[derive(Args)]
struct BatchArgs {
    /// Local SWE-bench export (JSONL or JSON array)
    #[arg(short, long, default_value = "swe-bench-lite.jsonl")]
    dataset: PathBuf,

    /// Output directory for artifacts
    #[arg(short, long, default_value = "results")]
    output_dir: PathBuf,

    /// Problems per model
    #[arg(short, long, default_value_t = 50)]
    problems: usize,

    /// Disable all pacing delays
    #[arg(long)]
    fast: bool,
}

#[derive(Args)]
struct SubmitArgs {
    /// Submission program
    #[arg(long, default_value = "sb-cli")]
    sb_cli: String,

    /// Evaluation dataset
    #[arg(long, default_value = "swe-bench_lite")]
    sb_dataset: String,

    /// Evaluation split
    #[arg(long, default_value = "test")]
    sb_split: String,

    /// SWE-bench API key, passed to the submission program
    #[arg(long, env = "SWEBENCH_API_KEY", hide_env_values = true)]
    swebench_api_key: Option<String>,
}

impl ModelArgs {
    fn apply(self, config: &mut Config) {
        config.models_file = self.models;
        config.filter = ModelFilter {
            keys: self.keys.into_iter().map(ModelKey::from).collect(),
            tier: self.tier,
            provider: self.provider,
            include_unavailable: self.include_unavailable,
        };
    }
}

impl GatewayArgs {
    fn apply(self, config: &mut Config) {
        config.openrouter_api_key = self.api_key;
        config.base_url = self.base_url;
        config.request_timeout_secs = self.request_timeout_secs;
    }
}

impl BatchArgs {
    fn apply(self, config: &mut Config) {
        config.dataset = self.dataset;
        config.output_dir = self.output_dir;
        config.problems_per_model = self.problems;
        config.fast = self.fast;
    }
}

impl SubmitArgs {
    fn apply(self, config: &mut Config) {
        config.sb_cli = self.sb_cli;
        config.sb_dataset = self.sb_dataset;
        config.sb_split = self.sb_split;
        config.swebench_api_key = self.swebench_api_key;
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout is reserved for JSON events and reports
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(std::env::var("RUST_LOG").ok().as_deref()))
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();

    if cli.json {
        json_output::enable_json_mode();
    }

    let mut config = Config::default();

    match cli.command {
        Commands::Run {
            models,
            gateway,
            batch,
            submit,
            no_submit,
            yes,
        } => {
            models.apply(&mut config);
            gateway.apply(&mut config);
            batch.apply(&mut config);
            submit.apply(&mut config);
            config.no_submit = no_submit;
            run(config, yes).await?;
        }
        Commands::Generate {
            key,
            models,
            gateway,
            batch,
        } => {
            config.models_file = models;
            gateway.apply(&mut config);
            batch.apply(&mut config);
            generate(config, &key).await?;
        }
        Commands::Submit {
            predictions,
            run_id,
            submit,
        } => {
            submit.apply(&mut config);
            submit_file(config, &predictions, run_id).await?;
        }
        Commands::Models { models } => {
            models.apply(&mut config);
            list_models(&config.registry()?)?;
        }
        Commands::Probe {
            models,
            gateway,
            quick,
        } => {
            models.apply(&mut config);
            gateway.apply(&mut config);
            let mode = if quick { ProbeMode::Quick } else { ProbeMode::Full };
            probe(config, mode).await?;
        }
    }

    Ok(())
}

async fn run(config: Config, skip_grace: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = config.registry()?;
    let gateway = Arc::new(config.gateway()?);
    let problems = load_problems(&config.dataset)?;

    info!(
        models = registry.len(),
        problems_per_model = config.problems_per_model,
        available_problems = problems.len(),
        output_dir = %config.output_dir.display(),
        submit = !config.no_submit,
        "Run configured"
    );
    for model in registry.iter() {
        info!(model = %model.key, remote_id = %model.remote_id, tier = %model.tier, "Queued");
    }

    if !skip_grace && !grace_period(GRACE_PERIOD_SECS).await {
        warn!("Cancelled before start");
        return Ok(());
    }

    let pacing = config.pacing();
    let orchestrator = Orchestrator::new(
        registry,
        JobRunner::new(gateway, pacing),
        ResultStore::new(&config.output_dir),
        config.submitter(),
        pacing,
        config.problems_per_model,
    );

    let summary = orchestrator.run(&problems).await?;
    if !json_output::is_json_mode() {
        print_summary(&summary);
    }

    Ok(())
}

async fn generate(config: Config, key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = config.catalog()?;
    let model = catalog.require(key)?;
    let gateway = Arc::new(config.gateway()?);
    let problems = load_problems(&config.dataset)?;

    let runner = JobRunner::new(gateway, config.pacing());
    let store = ResultStore::new(&config.output_dir);
    let (outcome, artifacts) =
        generate_baseline(&runner, &store, model, &problems, config.problems_per_model).await?;

    if !json_output::is_json_mode() {
        println!("Model:        {} ({})", model.name, model.key);
        println!("Predictions:  {}", outcome.prediction_count());
        println!("Errors:       {}", outcome.error_count());
        println!("Saved to:     {}", artifacts.predictions_file.display());
        if let Some(errors_file) = &artifacts.errors_file {
            println!("Error log:    {}", errors_file.display());
        }
    }

    Ok(())
}

async fn submit_file(
    config: Config,
    predictions: &Path,
    run_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !predictions.is_file() {
        return Err(format!("Predictions file not found: {}", predictions.display()).into());
    }

    let stem = predictions
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let run_id = RunId::new(run_id.unwrap_or_else(|| stem.clone()));
    let model_key = ModelKey::new(model_key_from_stem(&stem));

    let accepted = config
        .submitter()
        .submit(predictions, &model_key, &run_id)
        .await?;
    json_output::emit_submitted(model_key.as_str(), run_id.as_str(), accepted);

    if !accepted {
        return Err(format!("Submission of '{}' was not accepted", run_id).into());
    }
    if !json_output::is_json_mode() {
        println!("Submitted {} as {}", predictions.display(), run_id);
    }
    Ok(())
}

/// Recover the model key from a `baseline_{key}_{n}problems` file stem.
fn model_key_from_stem(stem: &str) -> &str {
    stem.strip_prefix("baseline_")
        .and_then(|rest| rest.rsplit_once('_'))
        .map(|(key, _)| key)
        .unwrap_or(stem)
}

fn list_models(registry: &ModelRegistry) -> Result<(), Box<dyn std::error::Error>> {
    if json_output::is_json_mode() {
        let models: Vec<_> = registry.iter().collect();
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    for provider in registry.providers() {
        println!("{}", provider);
        for model in registry.by_provider(provider) {
            println!(
                "  {:<16}  {:<6}  {:<20}  {:<32}  {}{}",
                model.key.as_str(),
                model.tier.as_str(),
                model.name,
                model.remote_id,
                model.context_window.as_deref().unwrap_or("-"),
                if model.available { "" } else { "  (unavailable)" }
            );
        }
        println!();
    }
    println!("{} models", registry.len());
    Ok(())
}

async fn probe(config: Config, mode: ProbeMode) -> Result<(), Box<dyn std::error::Error>> {
    let registry = config.registry()?;
    let gateway = Arc::new(config.gateway()?);
    let models = mode.select(&registry);
    if models.is_empty() {
        return Err("No models to probe".into());
    }

    let outcomes = Prober::new(gateway).probe(&models, mode).await;

    if !json_output::is_json_mode() {
        println!(
            "{:<16}  {:<6}  {:>8}  {:>7}  {}",
            "MODEL", "STATUS", "LATENCY", "TOKENS", "DETAIL"
        );
        println!("{}", "-".repeat(80));
        for outcome in &outcomes {
            println!(
                "{:<16}  {:<6}  {:>7.1}s  {:>7}  {}",
                outcome.model_key.as_str(),
                if outcome.success { "ok" } else { "FAIL" },
                outcome.elapsed.as_secs_f64(),
                outcome
                    .tokens
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                outcome
                    .preview
                    .as_deref()
                    .or(outcome.error.as_deref())
                    .unwrap_or("")
            );
        }
        let working = outcomes.iter().filter(|o| o.success).count();
        println!();
        println!("{}/{} models responded", working, outcomes.len());
    }

    Ok(())
}

/// `RUST_LOG` if set and valid, otherwise the default filter.
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|s| !s.trim().is_empty())
        .and_then(|s| EnvFilter::try_new(s).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Wait out the grace period. Returns false if Ctrl+C was pressed.
async fn grace_period(secs: u64) -> bool {
    info!("Starting in {} seconds, press Ctrl+C to cancel", secs);
    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(secs)) => true,
        _ = tokio::signal::ctrl_c() => false,
    }
}

fn print_summary(summary: &RunSummary) {
    println!();
    println!("{:<16}  {:<14}  {:>5}  {:>6}  {}", "MODEL", "STATE", "PREDS", "ERRORS", "RUN ID");
    println!("{}", "-".repeat(80));
    for report in &summary.log.results {
        println!(
            "{:<16}  {:<14}  {:>5}  {:>6}  {}",
            report.model_key.as_str(),
            report.state.as_str(),
            report.num_predictions,
            report.num_errors,
            report.run_id.as_ref().map(|r| r.as_str()).unwrap_or("-")
        );
    }
    println!();
    println!(
        "Submitted: {}/{}",
        summary.submitted(),
        summary.log.results.len()
    );
    println!("Failed:    {}", summary.failed());
    println!("Master log: {}", summary.master_log_path.display());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_key_from_stem() {
        assert_eq!(model_key_from_stem("baseline_grok_best_50problems"), "grok_best");
        assert_eq!(model_key_from_stem("my_run"), "my_run");
    }

    #[test]
    fn test_log_filter_prefers_rust_log() {
        let custom = log_filter(Some("benchrun=debug")).to_string();
        assert!(custom.contains("benchrun=debug"));
        assert!(!custom.contains("benchrun=info"));

        assert!(log_filter(None).to_string().contains("benchrun=info"));
        assert!(log_filter(Some("  ")).to_string().contains("benchrun=info"));
    }

    #[test]
    fn test_cli_parses_run_flags() {
        let cli = Cli::try_parse_from([
            "benchrun",
            "run",
            "--model",
            "grok_best,claude_budget",
            "--problems",
            "3",
            "--no-submit",
            "--fast",
            "--yes",
            "--api-key",
            "sk-test",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                models,
                batch,
                no_submit,
                yes,
                ..
            } => {
                assert_eq!(models.keys, vec!["grok_best", "claude_budget"]);
                assert_eq!(batch.problems, 3);
                assert!(batch.fast);
                assert!(no_submit);
                assert!(yes);
            }
            _ => panic!("expected run"),
        }
    }
}
