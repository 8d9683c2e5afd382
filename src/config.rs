use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use validator::Validate;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// What to do with predicates and projections that cannot be translated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientEvaluation {
    /// Evaluate on the client silently.
    Allow,
    /// Evaluate on the client and log a warning.
    #[default]
    Warn,
    /// Fail the query.
    Throw,
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("unknown client evaluation mode `{0}` (expected allow, warn or throw)")]
pub struct ParseClientEvaluationError(String);

impl FromStr for ClientEvaluation {
    type Err = ParseClientEvaluationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(ClientEvaluation::Allow),
            "warn" => Ok(ClientEvaluation::Warn),
            "throw" => Ok(ClientEvaluation::Throw),
            _ => Err(ParseClientEvaluationError(s.to_string())),
        }
    }
}

impl fmt::Display for ClientEvaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ClientEvaluation::Allow => "allow",
            ClientEvaluation::Warn => "warn",
            ClientEvaluation::Throw => "throw",
        };
        f.write_str(name)
    }
}

/// Translator configuration with validation
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslatorConfig {
    /// Handling of untranslatable expressions
    pub client_evaluation: ClientEvaluation,

    /// Whether parameter values appear in the SQL log
    pub sensitive_data_logging: bool,

    /// Parameters per statement (PostgreSQL's wire protocol allows 65535)
    #[validate(range(
        min = 1,
        max = 65535,
        message = "Max parameters must be between 1 and 65535"
    ))]
    pub max_parameters: usize,

    /// Schema used to qualify table names
    #[validate(length(min = 1, message = "Default schema cannot be empty"))]
    pub default_schema: Option<String>,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            client_evaluation: ClientEvaluation::Warn,
            sensitive_data_logging: false,
            max_parameters: 65535,
            default_schema: None,
        }
    }
}

impl TranslatorConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            client_evaluation: parse_env_var("PGARRAY_CLIENT_EVALUATION", "warn")?,
            sensitive_data_logging: parse_env_var("PGARRAY_SENSITIVE_DATA_LOGGING", "false")?,
            max_parameters: parse_env_var("PGARRAY_MAX_PARAMETERS", "65535")?,
            default_schema: env::var("PGARRAY_DEFAULT_SCHEMA").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            client_evaluation: cli.client_evaluation,
            sensitive_data_logging: cli.sensitive_data_logging,
            max_parameters: cli.max_parameters,
            default_schema: cli.default_schema,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub client_evaluation: ClientEvaluation,
    pub sensitive_data_logging: bool,
    pub max_parameters: usize,
    pub default_schema: Option<String>,
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
