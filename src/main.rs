use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};

use pgarray::config::{self, TranslatorConfig};
use pgarray::model_catalog::EntityModelConfig;
use pgarray::query_model::EntityQuery;

/// pgarray - compile host array queries to PostgreSQL
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Entity model YAML file
    #[arg(long)]
    model: PathBuf,

    /// Query file (.json, or YAML otherwise)
    #[arg(long)]
    query: PathBuf,

    /// Translator config YAML; takes precedence over the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Read the translator config from PGARRAY_* environment variables
    #[arg(long, conflicts_with = "config")]
    env: bool,

    /// Client evaluation mode (allow, warn, throw)
    #[arg(long, default_value_t = config::ClientEvaluation::Warn)]
    client_evaluation: config::ClientEvaluation,

    /// Show parameter values in the printed SQL
    #[arg(long)]
    sensitive_data_logging: bool,

    /// Maximum number of bound parameters per statement
    #[arg(long, default_value_t = 65535)]
    max_parameters: usize,

    /// Schema qualifying every table name
    #[arg(long)]
    default_schema: Option<String>,

    /// Print the compiled query as JSON
    #[arg(long)]
    json: bool,
}

impl From<&Cli> for config::CliConfig {
    fn from(cli: &Cli) -> Self {
        config::CliConfig {
            client_evaluation: cli.client_evaluation,
            sensitive_data_logging: cli.sensitive_data_logging,
            max_parameters: cli.max_parameters,
            default_schema: cli.default_schema.clone(),
        }
    }
}

fn translator_config(cli: &Cli) -> Result<TranslatorConfig, config::ConfigError> {
    match &cli.config {
        Some(path) => TranslatorConfig::from_yaml_file(path),
        None if cli.env => TranslatorConfig::from_env(),
        None => TranslatorConfig::from_cli(cli.into()),
    }
}

fn load_query(path: &Path) -> anyhow::Result<EntityQuery> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading query file {}", path.display()))?;
    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let query = if is_json {
        serde_json::from_str(&content).context("parsing JSON query")?
    } else {
        serde_yaml::from_str(&content).context("parsing YAML query")?
    };
    Ok(query)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logger - defaults to WARN level, can be overridden with RUST_LOG env var
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let translator_config = translator_config(&cli)?;

    let model = EntityModelConfig::from_yaml_file(&cli.model)?.to_model()?;
    log::debug!("Loaded entities {:?}", model.entity_names());
    let query = load_query(&cli.query)?;
    log::debug!("Compiling query over `{}`", query.entity);

    let compiled = pgarray::translate_query(&query, &model, &translator_config)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&compiled)?);
        return Ok(());
    }

    println!("{}", compiled.command.sql);
    for param in &compiled.command.parameters {
        if translator_config.sensitive_data_logging {
            println!("-- {} = {} ({})", param.name, param.value, param.ty);
        } else {
            println!("-- {} ({})", param.name, param.ty);
        }
    }
    if let Some(residual) = &compiled.residual_predicate {
        println!("-- evaluated on the client: {}", residual);
    }
    if let Some(projection) = &compiled.client_projection {
        println!("-- projected on the client: {}", projection);
    }
    Ok(())
}
