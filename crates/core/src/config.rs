use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::domain::product::CanonicalizationRule;
use crate::engine::tax::ReverseTaxTable;

use thiserror::Error;

/// Effective application configuration after defaults, optional TOML file,
/// `REPLEN_*` environment overrides, and caller overrides are applied, in
/// that precedence order.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub engine: EngineConfig,
    pub data: DataConfig,
    pub logging: LoggingConfig,
}

/// Business-rule parameters consumed by the engines. All of these are
/// externally supplied; the engines carry no numeric literals of their own.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Stock-cover multiple: target stock is this many periods of average
    /// demand. Must be positive.
    pub reposition_factor: Decimal,
    /// How product identifiers are canonicalized for cross-source matching.
    pub canonicalization: CanonicalizationRule,
    /// Reverse-tax treatment per tax-operation code. Ships empty; codes
    /// used by data must be configured explicitly.
    pub tax_codes: ReverseTaxTable,
}

#[derive(Clone, Debug)]
pub struct DataConfig {
    /// Directory the CLI reads domestic snapshot CSVs from.
    pub snapshot_dir: PathBuf,
    pub informe: InformeLayout,
}

/// Positional layout of the cross-border informe sheet export. The sheet
/// carries no usable header row, so fields are picked by column index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct InformeLayout {
    pub skip_rows: usize,
    pub code_column: usize,
    pub product_column: usize,
    pub brand_column: usize,
    pub quantity_column: usize,
    pub stock_column: usize,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub reposition_factor: Option<Decimal>,
    pub snapshot_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig {
                reposition_factor: Decimal::new(11, 1),
                canonicalization: CanonicalizationRule::default(),
                tax_codes: ReverseTaxTable::new(),
            },
            data: DataConfig {
                snapshot_dir: PathBuf::from("data"),
                informe: InformeLayout::default(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl Default for InformeLayout {
    fn default() -> Self {
        // Matches the sheet layout the cross-border system exports today.
        Self {
            skip_rows: 2,
            code_column: 1,
            product_column: 4,
            brand_column: 10,
            quantity_column: 11,
            stock_column: 12,
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

fn parse_canonicalization(key: &str, value: &str) -> Result<CanonicalizationRule, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "alphanumeric_upper" => Ok(CanonicalizationRule::AlphanumericUpper),
        "trim_upper" => Ok(CanonicalizationRule::TrimUpper),
        _ => Err(ConfigError::InvalidEnvOverride {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("replen.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(engine) = patch.engine {
            if let Some(reposition_factor) = engine.reposition_factor {
                self.engine.reposition_factor = reposition_factor;
            }
            if let Some(canonicalization) = engine.canonicalization {
                self.engine.canonicalization = canonicalization;
            }
            if let Some(tax_codes) = engine.tax_codes {
                self.engine.tax_codes = tax_codes;
            }
        }

        if let Some(data) = patch.data {
            if let Some(snapshot_dir) = data.snapshot_dir {
                self.data.snapshot_dir = snapshot_dir;
            }
            if let Some(informe) = data.informe {
                self.data.informe = informe;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("REPLEN_REPOSITION_FACTOR") {
            self.engine.reposition_factor = parse_decimal("REPLEN_REPOSITION_FACTOR", &value)?;
        }
        if let Some(value) = read_env("REPLEN_CANONICALIZATION") {
            self.engine.canonicalization =
                parse_canonicalization("REPLEN_CANONICALIZATION", &value)?;
        }

        if let Some(value) = read_env("REPLEN_SNAPSHOT_DIR") {
            self.data.snapshot_dir = PathBuf::from(value);
        }
        if let Some(value) = read_env("REPLEN_INFORME_SKIP_ROWS") {
            self.data.informe.skip_rows = parse_usize("REPLEN_INFORME_SKIP_ROWS", &value)?;
        }

        let log_level = read_env("REPLEN_LOGGING_LEVEL").or_else(|| read_env("REPLEN_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("REPLEN_LOGGING_FORMAT").or_else(|| read_env("REPLEN_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(reposition_factor) = overrides.reposition_factor {
            self.engine.reposition_factor = reposition_factor;
        }
        if let Some(snapshot_dir) = overrides.snapshot_dir {
            self.data.snapshot_dir = snapshot_dir;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_engine(&self.engine)?;
        validate_data(&self.data)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn validate_engine(engine: &EngineConfig) -> Result<(), ConfigError> {
    if engine.reposition_factor <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "engine.reposition_factor must be greater than zero".to_string(),
        ));
    }

    engine
        .tax_codes
        .validate()
        .map_err(|error| ConfigError::Validation(error.to_string()))?;

    Ok(())
}

fn validate_data(data: &DataConfig) -> Result<(), ConfigError> {
    let layout = &data.informe;
    let columns = [
        layout.code_column,
        layout.product_column,
        layout.brand_column,
        layout.quantity_column,
        layout.stock_column,
    ];
    for (index, column) in columns.iter().enumerate() {
        if columns[index + 1..].contains(column) {
            return Err(ConfigError::Validation(format!(
                "data.informe column positions must be distinct (column {column} repeats)"
            )));
        }
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    if logging.level.trim().is_empty() {
        return Err(ConfigError::Validation("logging.level must not be empty".to_string()));
    }

    Ok(())
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    if let Some(path) = read_env("REPLEN_CONFIG") {
        let path = PathBuf::from(path);
        return path.exists().then_some(path);
    }

    [PathBuf::from("replen.toml"), PathBuf::from("config/replen.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_decimal(key: &str, value: &str) -> Result<Decimal, ConfigError> {
    value.trim().parse::<Decimal>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.parse::<usize>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    engine: Option<EnginePatch>,
    data: Option<DataPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct EnginePatch {
    reposition_factor: Option<Decimal>,
    canonicalization: Option<CanonicalizationRule>,
    tax_codes: Option<ReverseTaxTable>,
}

#[derive(Debug, Default, Deserialize)]
struct DataPatch {
    snapshot_dir: Option<PathBuf>,
    informe: Option<InformeLayout>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
