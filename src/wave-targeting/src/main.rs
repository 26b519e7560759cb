//! Wave Targeting: profit-based direct-mail targeting and cutoff selection.
//!
//! Plans a mailing from a scored customer file, compares score columns, or
//! serves the targeting API.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info, warn};
use wave_api::{ApiServer, AppState};
use wave_core::config::AppConfig;
use wave_core::{CutoffRule, ScenarioOverrides, ScenarioParams};
use wave_data::{ColumnResolver, LoadedDataset};
use wave_engine::TargetingPlan;

#[derive(Parser, Debug)]
#[command(name = "wave-targeting")]
#[command(about = "Profit-based direct-mail targeting and cutoff selection")]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); environment variables override it
    #[arg(long, global = true, env = "WAVE_TARGETING_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rank a scored file, pick a cutoff and write the mailing list
    Plan(PlanArgs),
    /// Plan each score column under one scenario and rank the models
    Compare(CompareArgs),
    /// Serve the targeting REST API
    Serve(ServeArgs),
}

#[derive(Args, Debug, Default)]
struct ScenarioArgs {
    /// Cost of mailing one customer
    #[arg(long)]
    mail_cost: Option<f64>,

    /// Margin earned per responder
    #[arg(long)]
    margin: Option<f64>,

    /// Decay applied to the observed response probability
    #[arg(long)]
    multiplier: Option<f64>,

    /// Cutoff rule: expected_profit_positive, peak_cumulative_profit or top_n
    #[arg(long)]
    rule: Option<CutoffRule>,

    /// Mailing depth for the top_n rule
    #[arg(long)]
    top_n: Option<i64>,
}

impl ScenarioArgs {
    fn overrides(&self) -> ScenarioOverrides {
        ScenarioOverrides {
            mail_cost: self.mail_cost,
            margin_per_responder: self.margin,
            response_multiplier: self.multiplier,
            cutoff_rule: self.rule,
            top_n: self.top_n,
        }
    }
}

#[derive(Args, Debug)]
struct PlanArgs {
    /// Scored customer file (overrides data.input_path)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Write the id,mail list here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write the full ranking with cumulative profit here
    #[arg(long)]
    ranked_output: Option<PathBuf>,

    /// Population the plan is projected onto (overrides config)
    #[arg(long)]
    eligible_population: Option<u64>,

    #[command(flatten)]
    scenario: ScenarioArgs,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Scored customer file (overrides data.input_path)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Score column to compare; repeat once per model
    #[arg(long = "score-column", required = true)]
    score_columns: Vec<String>,

    #[command(flatten)]
    scenario: ScenarioArgs,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Scored customer file (overrides data.input_path)
    #[arg(long)]
    input: Option<PathBuf>,

    /// HTTP port (overrides config)
    #[arg(long, env = "WAVE_TARGETING__API__HTTP_PORT")]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout is reserved for command output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wave_targeting=info,wave_engine=info,tower_http=info".into()
            }),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Command::Plan(args) => run_plan(config, args),
        Command::Compare(args) => run_compare(config, args),
        Command::Serve(args) => run_serve(config, args).await,
    }
}

fn scenario(config: &AppConfig, args: &ScenarioArgs) -> anyhow::Result<ScenarioParams> {
    let params = args.overrides().apply(&config.scenario.to_params());
    params.validate()?;
    Ok(params)
}

fn input_path(config: &AppConfig, input: Option<PathBuf>) -> anyhow::Result<PathBuf> {
    input
        .or_else(|| config.data.input_path.as_ref().map(PathBuf::from))
        .ok_or_else(|| anyhow::anyhow!("no input file: pass --input or set data.input_path"))
}

fn load(config: &AppConfig, path: &Path, resolver: &ColumnResolver) -> anyhow::Result<LoadedDataset> {
    let delimiter = config.data.delimiter_byte().map_err(anyhow::Error::msg)?;
    Ok(wave_data::load_dataset_file(path, resolver, delimiter)?)
}

fn run_plan(config: AppConfig, args: PlanArgs) -> anyhow::Result<()> {
    let params = scenario(&config, &args.scenario)?;
    let path = input_path(&config, args.input)?;
    let dataset = load(&config, &path, &ColumnResolver::from_config(&config.data))?;

    let plan = TargetingPlan::build(&dataset.table, &params)?;
    let eligible = args
        .eligible_population
        .unwrap_or(config.projection.eligible_population);
    let projection = plan.project(eligible);

    if let Some(output) = &args.output {
        wave_data::write_mailing_list_file(output, &plan.decisions())?;
    }
    if let Some(ranked_output) = &args.ranked_output {
        wave_data::write_ranked_table_file(
            ranked_output,
            &dataset.table,
            &plan.ranked,
            plan.cutoff_rank,
        )?;
    }

    let report = serde_json::json!({
        "dataset": {
            "source": dataset.source,
            "fingerprint": dataset.fingerprint,
            "score_column": dataset.score_column,
            "score_kind": dataset.score_kind,
        },
        "scenario": plan.scenario,
        "summary": plan.summary,
        "projection": projection,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_compare(config: AppConfig, args: CompareArgs) -> anyhow::Result<()> {
    let params = scenario(&config, &args.scenario)?;
    let path = input_path(&config, args.input)?;
    let delimiter = config.data.delimiter_byte().map_err(anyhow::Error::msg)?;
    let bytes = std::fs::read(&path)?;
    let source = path.display().to_string();

    let mut datasets = Vec::with_capacity(args.score_columns.len());
    for column in &args.score_columns {
        let mut resolver = ColumnResolver::new().with_score_column(column.clone());
        if let Some(id_column) = &config.data.id_column {
            resolver = resolver.with_id_column(id_column.clone());
        }
        datasets.push((
            column.clone(),
            LoadedDataset::from_bytes(source.clone(), &bytes, &resolver, delimiter)?,
        ));
    }

    let candidates: Vec<_> = datasets
        .iter()
        .map(|(column, dataset)| (column.clone(), &dataset.table))
        .collect();
    let ranking = wave_engine::compare_models(&candidates, &params)?;
    info!(models = ranking.len(), "Model comparison complete");

    let report = serde_json::json!({
        "scenario": params,
        "models": ranking,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    // Apply CLI overrides
    if let Some(input) = args.input {
        config.data.input_path = Some(input.display().to_string());
    }
    if let Some(port) = args.http_port {
        config.api.http_port = port;
    }

    info!(
        node_id = %config.node_id,
        http_port = config.api.http_port,
        metrics_port = config.metrics.port,
        input = ?config.data.input_path,
        "Configuration loaded"
    );

    let path = input_path(&config, None)?;
    let dataset = load(&config, &path, &ColumnResolver::from_config(&config.data))?;
    let state = AppState::new(&config, dataset);
    let api_server = ApiServer::new(config.clone(), state.clone());

    // Start metrics exporter
    if let Err(e) = api_server.start_metrics().await {
        error!(error = %e, "Failed to start metrics exporter");
    }

    // Spawn cache maintenance task
    let cache_for_maintenance = state.cache.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            let evicted = cache_for_maintenance.evict_expired();
            if evicted > 0 {
                info!(evicted, "Expired plans evicted");
            }
        }
    });

    info!("Wave Targeting is ready to serve plans");

    // Start HTTP server (blocks until shutdown)
    api_server.start_http().await?;

    Ok(())
}
