//! Translation capability shared by every provider

pub mod batch;
pub mod providers;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub use batch::{BatchOptions, BatchPolicy, BatchReport, BatchTranslator, Delimiter};

/// Distinct source text -> translated text for one direction
pub type TranslationMap = HashMap<String, String>;

/// A single translation backend.
///
/// Implementations differ in credentials, request shape, response parsing
/// and size limits; callers only ever see `translate`.
pub trait Translator: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    /// Translate one string, failing with a [`TranslateError`] on any problem
    fn translate(&self, text: &str) -> Result<String, TranslateError>;

    /// Whether long merged payloads are accepted (enables character-bounded batches)
    fn accepts_long_input(&self) -> bool {
        false
    }
}

impl<T: Translator + ?Sized> Translator for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        (**self).translate(text)
    }

    fn accepts_long_input(&self) -> bool {
        (**self).accepts_long_input()
    }
}

/// Why a provider call failed. The batch translator treats every kind the same.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Blank input")]
    BlankInput,
}

impl From<reqwest::Error> for TranslateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TranslateError::MalformedResponse(err.to_string())
        } else {
            TranslateError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TranslateError {
    fn from(err: serde_json::Error) -> Self {
        TranslateError::MalformedResponse(err.to_string())
    }
}

/// Reject blank input before it reaches the network
pub fn ensure_not_blank(text: &str) -> Result<(), TranslateError> {
    if text.trim().is_empty() {
        Err(TranslateError::BlankInput)
    } else {
        Ok(())
    }
}

/// Translation direction assigned to a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    /// Chinese to English
    ZhToEn,
    /// English to Chinese
    EnToZh,
}

impl Direction {
    pub const ALL: [Direction; 2] = [Direction::ZhToEn, Direction::EnToZh];

    /// Suffix appended to the header of the synthetic column
    pub fn header_suffix(&self) -> &'static str {
        match self {
            Direction::ZhToEn => "_en",
            Direction::EnToZh => "_zh",
        }
    }

    pub fn source(&self) -> Language {
        match self {
            Direction::ZhToEn => Language::Chinese,
            Direction::EnToZh => Language::English,
        }
    }

    pub fn target(&self) -> Language {
        match self {
            Direction::ZhToEn => Language::English,
            Direction::EnToZh => Language::Chinese,
        }
    }

    /// Parse user input such as `zh2en`, `zh-to-en`, `en2zh`
    pub fn parse(input: &str) -> Option<Self> {
        let normalized: String = input
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "zh2en" | "zhtoen" | "zhen" => Some(Direction::ZhToEn),
            "en2zh" | "entozh" | "enzh" => Some(Direction::EnToZh),
            _ => None,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ZhToEn => write!(f, "zh→en"),
            Direction::EnToZh => write!(f, "en→zh"),
        }
    }
}

/// The two languages handled by this tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Chinese,
    English,
}

impl Language {
    pub fn as_str(&self) -> &str {
        match self {
            Language::Chinese => "Chinese",
            Language::English => "English",
        }
    }
}
