//! Settings resolution: TOML file, environment and command line

use crate::projector::{HeaderStyle, Placement, ProjectionOptions};
use crate::translate::BatchOptions;
use crate::translate::batch::{BatchPolicy, DEFAULT_BATCH_SIZE, DEFAULT_MAX_CHARS};
use crate::translate::providers::ProviderKind;
use crate::translate::providers::deepseek;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sheetlingo.toml";

const DEFAULT_DELAY_MS: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Worker pool size for staged runs on providers other than deepseek
const DEFAULT_STAGED_WORKERS: usize = 3;

/// Configuration file contents; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub translation: TranslationSection,
    pub batch: BatchSection,
    pub output: OutputSection,
    pub api: ApiSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSection {
    pub provider: Option<ProviderKind>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSection {
    pub policy: Option<BatchPolicy>,
    pub size: Option<usize>,
    pub max_chars: Option<usize>,
    pub delay_ms: Option<u64>,
    pub item_delay_ms: Option<u64>,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    pub placement: Option<Placement>,
    pub header: Option<HeaderStyle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub baidu_appid: Option<String>,
    pub baidu_key: Option<String>,
    pub deepl_key: Option<String>,
    pub deepseek_key: Option<String>,
    pub deepseek_url: Option<String>,
    pub deepseek_model: Option<String>,
}

impl FileSettings {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let settings: FileSettings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Commented template written by `gen-config`
    pub fn template() -> &'static str {
        CONFIG_TEMPLATE
    }
}

/// Values given on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub provider: Option<ProviderKind>,
    pub policy: Option<BatchPolicy>,
    pub batch_size: Option<usize>,
    pub max_chars: Option<usize>,
    pub delay_ms: Option<u64>,
    pub workers: Option<usize>,
    pub placement: Option<Placement>,
    pub header: Option<HeaderStyle>,
    pub timeout_secs: Option<u64>,
    pub baidu_appid: Option<String>,
    pub baidu_key: Option<String>,
    pub deepl_key: Option<String>,
    pub deepseek_key: Option<String>,
    pub deepseek_url: Option<String>,
    pub deepseek_model: Option<String>,
    /// The run goes through CSV staging
    pub staged: bool,
}

/// Provider credentials after resolution
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub baidu_appid: Option<String>,
    pub baidu_key: Option<String>,
    pub deepl_key: Option<String>,
    pub deepseek_key: Option<String>,
    pub deepseek_url: String,
    pub deepseek_model: String,
}

/// Fully resolved, immutable run settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: ProviderKind,
    pub timeout: Duration,
    pub batch: BatchOptions,
    pub projection: ProjectionOptions,
    pub credentials: Credentials,
}

impl Settings {
    /// Merge sources with precedence CLI > environment > file > defaults
    pub fn resolve(
        file: &FileSettings,
        env: &HashMap<String, String>,
        cli: &CliOverrides,
    ) -> Result<Self> {
        let env_value = |key: &str| {
            env.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let env_provider = env_value("SHEETLINGO_PROVIDER")
            .map(|p| p.parse::<ProviderKind>())
            .transpose()
            .context("Invalid SHEETLINGO_PROVIDER")?;

        let provider = cli
            .provider
            .or(env_provider)
            .or(file.translation.provider)
            .unwrap_or_default();

        let batch = BatchOptions {
            policy: cli.policy.or(file.batch.policy),
            batch_size: cli
                .batch_size
                .or(file.batch.size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
            max_chars: cli
                .max_chars
                .or(file.batch.max_chars)
                .unwrap_or(DEFAULT_MAX_CHARS),
            delay: Duration::from_millis(
                cli.delay_ms.or(file.batch.delay_ms).unwrap_or(DEFAULT_DELAY_MS),
            ),
            item_delay: Duration::from_millis(file.batch.item_delay_ms.unwrap_or(0)),
            workers: cli
                .workers
                .or(file.batch.workers)
                .unwrap_or_else(|| default_workers(provider, cli.staged)),
        };

        let projection = ProjectionOptions {
            placement: cli.placement.or(file.output.placement).unwrap_or_default(),
            header: cli.header.or(file.output.header).unwrap_or_default(),
        };

        let api = &file.api;
        let credentials = Credentials {
            baidu_appid: pick(&cli.baidu_appid, env_value("BAIDU_API_ID"), &api.baidu_appid),
            baidu_key: pick(&cli.baidu_key, env_value("BAIDU_API_KEY"), &api.baidu_key),
            deepl_key: pick(&cli.deepl_key, env_value("DEEPL_API_KEY"), &api.deepl_key),
            deepseek_key: pick(&cli.deepseek_key, env_value("DEEPSEEK_API_KEY"), &api.deepseek_key),
            deepseek_url: pick(&cli.deepseek_url, env_value("DEEPSEEK_API_URL"), &api.deepseek_url)
                .unwrap_or_else(|| deepseek::DEFAULT_API_URL.to_string()),
            deepseek_model: pick(&cli.deepseek_model, None, &api.deepseek_model)
                .unwrap_or_else(|| deepseek::DEFAULT_MODEL.to_string()),
        };

        let timeout_secs = cli
            .timeout_secs
            .or(file.translation.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let settings = Settings {
            provider,
            timeout: Duration::from_secs(timeout_secs),
            batch,
            projection,
            credentials,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve against the process environment
    pub fn from_environment(file: &FileSettings, cli: &CliOverrides) -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::resolve(file, &env, cli)
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch.batch_size == 0 {
            anyhow::bail!("Configuration error: batch size must be at least 1");
        }
        if self.batch.max_chars == 0 {
            anyhow::bail!("Configuration error: max_chars must be at least 1");
        }
        if self.batch.workers == 0 {
            anyhow::bail!("Configuration error: workers must be at least 1");
        }
        if self.timeout.is_zero() {
            anyhow::bail!("Configuration error: timeout_secs must be at least 1");
        }
        Ok(())
    }
}

fn default_workers(provider: ProviderKind, staged: bool) -> usize {
    if staged && provider != ProviderKind::DeepSeek {
        DEFAULT_STAGED_WORKERS
    } else {
        1
    }
}

fn pick(cli: &Option<String>, env: Option<String>, file: &Option<String>) -> Option<String> {
    non_empty(cli).or(env).or_else(|| non_empty(file))
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

const CONFIG_TEMPLATE: &str = r#"# sheetlingo configuration
#
# Values given on the command line override environment variables,
# which override this file.

[translation]
# mymemory | google | baidu | deepl | deepseek
provider = "mymemory"
# HTTP timeout per provider call
timeout_secs = 30

[batch]
# count: fixed number of strings per request
# chars: strings packed up to max_chars (default for deepseek)
# policy = "count"
size = 10
max_chars = 3500
# Pause between batches
delay_ms = 1000
# Pause between single-string retries after a failed batch
item_delay_ms = 0
# Batches translated concurrently (default 1, or 3 for --staged runs)
# workers = 1

[output]
# after | before
placement = "after"
# suffix: "<header>_en" / "<header>_zh"
# translated: translate the header text itself
header = "suffix"

[api]
# Environment: BAIDU_API_ID, BAIDU_API_KEY
# baidu_appid = ""
# baidu_key = ""
# Environment: DEEPL_API_KEY (keys ending in ":fx" use the free endpoint)
# deepl_key = ""
# Environment: DEEPSEEK_API_KEY, DEEPSEEK_API_URL
# deepseek_key = ""
# deepseek_url = "https://api.deepseek.com/v1/chat/completions"
# deepseek_model = "deepseek-chat"
"#;
