//! Translation provider registry and shared HTTP plumbing

pub mod baidu;
pub mod deepl;
pub mod deepseek;
pub mod google;
pub mod mymemory;

use super::{Direction, TranslateError, Translator};
use crate::config::Settings;
use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use baidu::BaiduTranslator;
pub use deepl::DeepLTranslator;
pub use deepseek::DeepSeekTranslator;
pub use google::GoogleTranslator;
pub use mymemory::MyMemoryTranslator;

/// Supported translation backends
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    MyMemory,
    Google,
    Baidu,
    DeepL,
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 5] = [
        ProviderKind::MyMemory,
        ProviderKind::Google,
        ProviderKind::Baidu,
        ProviderKind::DeepL,
        ProviderKind::DeepSeek,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::MyMemory => "mymemory",
            ProviderKind::Google => "google",
            ProviderKind::Baidu => "baidu",
            ProviderKind::DeepL => "deepl",
            ProviderKind::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == wanted)
            .with_context(|| {
                let known: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown provider '{}' (expected one of: {})", s, known.join(", "))
            })
    }
}

/// Build the translator for one direction from resolved settings.
///
/// Missing credentials are reported here, before any file is touched.
pub fn create_translator(
    kind: ProviderKind,
    direction: Direction,
    settings: &Settings,
) -> Result<Box<dyn Translator>> {
    let client = http_client(settings.timeout)?;
    let credentials = &settings.credentials;

    let translator: Box<dyn Translator> = match kind {
        ProviderKind::MyMemory => Box::new(MyMemoryTranslator::new(client, direction)),
        ProviderKind::Google => Box::new(GoogleTranslator::new(client, direction)),
        ProviderKind::Baidu => {
            let appid = require(&credentials.baidu_appid, "Baidu app id", "--baidu-appid", "BAIDU_API_ID")?;
            let key = require(&credentials.baidu_key, "Baidu secret key", "--baidu-key", "BAIDU_API_KEY")?;
            Box::new(BaiduTranslator::new(client, direction, appid, key))
        }
        ProviderKind::DeepL => {
            let key = require(&credentials.deepl_key, "DeepL auth key", "--deepl-key", "DEEPL_API_KEY")?;
            Box::new(DeepLTranslator::new(client, direction, key))
        }
        ProviderKind::DeepSeek => {
            let key = require(
                &credentials.deepseek_key,
                "DeepSeek API key",
                "--deepseek-key",
                "DEEPSEEK_API_KEY",
            )?;
            Box::new(DeepSeekTranslator::new(
                client,
                direction,
                key,
                credentials.deepseek_url.clone(),
                credentials.deepseek_model.clone(),
            ))
        }
    };

    Ok(translator)
}

fn require(value: &Option<String>, what: &str, flag: &str, env: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => anyhow::bail!("{} is required: pass {} or set {}", what, flag, env),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("sheetlingo/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")
}

/// Turn non-success statuses into errors, keeping the body for the log
pub(crate) fn check_status(response: Response) -> Result<Response, TranslateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().unwrap_or_default();
    Err(status_error(status, body))
}

pub(crate) fn status_error(status: StatusCode, body: String) -> TranslateError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            TranslateError::Auth(format!("{} {}", status.as_u16(), body.trim()))
        }
        _ => TranslateError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CliOverrides, FileSettings};
    use std::collections::HashMap;

    fn settings_with(cli: CliOverrides) -> Settings {
        Settings::resolve(&FileSettings::default(), &HashMap::new(), &cli).unwrap()
    }

    #[test]
    fn test_provider_kind_parse() {
        assert_eq!("google".parse::<ProviderKind>().unwrap(), ProviderKind::Google);
        assert_eq!(" DeepSeek ".parse::<ProviderKind>().unwrap(), ProviderKind::DeepSeek);
        assert!("bing".parse::<ProviderKind>().is_err());
        for kind in ProviderKind::ALL {
            assert_eq!(kind.to_string().parse::<ProviderKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_free_providers_need_no_credentials() {
        let settings = settings_with(CliOverrides::default());
        for kind in [ProviderKind::MyMemory, ProviderKind::Google] {
            let translator = create_translator(kind, Direction::ZhToEn, &settings).unwrap();
            assert_eq!(translator.name(), kind.as_str());
            assert!(!translator.accepts_long_input());
        }
    }

    #[test]
    fn test_missing_credentials_are_rejected() {
        let settings = settings_with(CliOverrides::default());
        for kind in [ProviderKind::Baidu, ProviderKind::DeepL, ProviderKind::DeepSeek] {
            let err = create_translator(kind, Direction::EnToZh, &settings)
                .err()
                .unwrap();
            assert!(err.to_string().contains("is required"));
        }
    }

    #[test]
    fn test_deepseek_accepts_long_input() {
        let settings = settings_with(CliOverrides {
            deepseek_key: Some("sk-test".to_string()),
            ..Default::default()
        });
        let translator =
            create_translator(ProviderKind::DeepSeek, Direction::ZhToEn, &settings).unwrap();
        assert!(translator.accepts_long_input());
    }

    #[test]
    fn test_status_error_mapping() {
        assert!(matches!(
            status_error(StatusCode::FORBIDDEN, "bad key".to_string()),
            TranslateError::Auth(_)
        ));
        assert!(matches!(
            status_error(StatusCode::TOO_MANY_REQUESTS, String::new()),
            TranslateError::Status { status: 429, .. }
        ));
    }
}
