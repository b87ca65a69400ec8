use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::color::{ColorChoice, Rgb};
use crate::patterns::PatternType;
use crate::show::ShowMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{0} requires a value")]
    MissingValue(String),
    #[error("unknown option: {0}")]
    UnknownOption(String),
    #[error("invalid value for {flag}: {value}")]
    InvalidValue { flag: String, value: String },
    #[error("invalid hex color: {0} (expected RRGGBB, e.g. 1a1b26)")]
    InvalidColor(String),
    #[error("unknown firework pattern: {0}")]
    UnknownPattern(String),
    #[error("unknown color: {0}")]
    UnknownColor(String),
    #[error("unknown show mode: {0}")]
    UnknownMode(String),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logical viewport height; the width follows the terminal's aspect.
    pub world_height: f32,
    pub mode: ShowMode,
    pub pattern: PatternType,
    pub color: ColorChoice,
    /// Opacity of the veil painted over each frame.
    pub fade: f32,
    /// Ring the terminal bell on explosions.
    pub sound: bool,
    pub seed: Option<u64>,
    #[serde(deserialize_with = "hex_color")]
    pub bg_color: Rgb,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            world_height: 800.0,
            mode: ShowMode::Festival,
            pattern: PatternType::Random,
            color: ColorChoice::Random,
            fade: 0.05,
            sound: false,
            seed: None,
            bg_color: Rgb::new(0, 0, 0),
            log_file: None,
        }
    }
}

fn hex_color<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<Rgb, D::Error> {
    let hex = String::deserialize(deserializer)?;
    Rgb::parse_hex(&hex).ok_or_else(|| serde::de::Error::custom(ConfigError::InvalidColor(hex)))
}

/// What the command line asked for.
#[derive(Debug, PartialEq)]
pub enum Command {
    Run(Config),
    Help,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        flag: flag.to_string(),
        value: value.to_string(),
    })
}

/// Parses arguments (without the program name). A `--config` file is applied
/// first so that other flags override it regardless of their order.
pub fn parse_args<I, S>(args: I) -> Result<Command, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let args: Vec<String> = args.into_iter().map(Into::into).collect();

    let mut config = Config::default();
    if let Some(pos) = args.iter().position(|a| a == "--config") {
        let path = args
            .get(pos + 1)
            .ok_or_else(|| ConfigError::MissingValue("--config".to_string()))?;
        config = Config::load(Path::new(path))?;
    }

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        if matches!(flag, "help" | "--help" | "-h") {
            return Ok(Command::Help);
        }
        if flag == "--sound" {
            config.sound = true;
            i += 1;
            continue;
        }

        let value = args
            .get(i + 1)
            .map(String::as_str)
            .ok_or_else(|| {
                if flag.starts_with('-') {
                    ConfigError::MissingValue(flag.to_string())
                } else {
                    ConfigError::UnknownOption(flag.to_string())
                }
            })?;

        match flag {
            "--config" => {}
            "--mode" => config.mode = value.parse()?,
            "--pattern" => config.pattern = value.parse()?,
            "--color" => config.color = value.parse()?,
            "--fade" => config.fade = parse_number(flag, value)?,
            "--seed" => config.seed = Some(parse_number(flag, value)?),
            "--world-height" => config.world_height = parse_number(flag, value)?,
            "--bg-color" => {
                config.bg_color = Rgb::parse_hex(value).ok_or_else(|| ConfigError::InvalidColor(value.to_string()))?
            }
            "--log-file" => config.log_file = Some(PathBuf::from(value)),
            _ => return Err(ConfigError::UnknownOption(flag.to_string())),
        }
        i += 2;
    }

    if !(config.fade.is_finite() && (0.0..=1.0).contains(&config.fade)) {
        return Err(ConfigError::InvalidValue {
            flag: "fade".to_string(),
            value: config.fade.to_string(),
        });
    }
    if !(config.world_height.is_finite() && config.world_height > 0.0) {
        return Err(ConfigError::InvalidValue {
            flag: "world-height".to_string(),
            value: config.world_height.to_string(),
        });
    }

    Ok(Command::Run(config))
}
