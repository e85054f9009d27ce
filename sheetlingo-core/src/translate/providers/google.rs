//! Google Translate public web endpoint (`client=gtx`, no key)

use super::check_status;
use crate::translate::{Direction, TranslateError, Translator, ensure_not_blank};
use reqwest::blocking::Client;
use serde_json::Value;

const API_URL: &str = "https://translate.googleapis.com/translate_a/single";

pub struct GoogleTranslator {
    client: Client,
    source: &'static str,
    target: &'static str,
}

impl GoogleTranslator {
    pub fn new(client: Client, direction: Direction) -> Self {
        let (source, target) = match direction {
            Direction::ZhToEn => ("zh-CN", "en"),
            Direction::EnToZh => ("en", "zh-CN"),
        };
        Self {
            client,
            source,
            target,
        }
    }
}

impl Translator for GoogleTranslator {
    fn name(&self) -> &str {
        "google"
    }

    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        ensure_not_blank(text)?;

        let response = self
            .client
            .get(API_URL)
            .query(&[
                ("client", "gtx"),
                ("sl", self.source),
                ("tl", self.target),
                ("dt", "t"),
                ("q", text),
            ])
            .send()?;
        let body: Value = check_status(response)?.json()?;
        parse_response(&body)
    }
}

/// The first element holds `[translated, original, ...]` segments, one per sentence
fn parse_response(body: &Value) -> Result<String, TranslateError> {
    let segments = body
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| TranslateError::MalformedResponse("missing sentence list".to_string()))?;

    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        return Err(TranslateError::MalformedResponse(
            "no translated segments".to_string(),
        ));
    }
    Ok(translated)
}
