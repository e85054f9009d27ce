//! MyMemory free translation API

use super::check_status;
use crate::translate::{Direction, TranslateError, Translator, ensure_not_blank};
use reqwest::blocking::Client;
use serde_json::Value;

const API_URL: &str = "https://api.mymemory.translated.net/get";

pub struct MyMemoryTranslator {
    client: Client,
    langpair: &'static str,
}

impl MyMemoryTranslator {
    pub fn new(client: Client, direction: Direction) -> Self {
        let langpair = match direction {
            Direction::ZhToEn => "zh-CN|en-GB",
            Direction::EnToZh => "en-GB|zh-CN",
        };
        Self { client, langpair }
    }
}

impl Translator for MyMemoryTranslator {
    fn name(&self) -> &str {
        "mymemory"
    }

    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        ensure_not_blank(text)?;

        let response = self
            .client
            .get(API_URL)
            .query(&[("q", text), ("langpair", self.langpair)])
            .send()?;
        let body: Value = check_status(response)?.json()?;
        parse_response(&body)
    }
}

/// MyMemory reports its own status inside a 200 body
fn parse_response(body: &Value) -> Result<String, TranslateError> {
    let status = match &body["responseStatus"] {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };

    if let Some(status) = status {
        if status != 200 {
            let details = body["responseDetails"].as_str().unwrap_or_default();
            return Err(TranslateError::Status {
                status: u16::try_from(status).unwrap_or(u16::MAX),
                body: details.to_string(),
            });
        }
    }

    body["responseData"]["translatedText"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| {
            TranslateError::MalformedResponse("missing responseData.translatedText".to_string())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_success() {
        let body = json!({
            "responseData": {"translatedText": "Apple", "match": 1},
            "responseStatus": 200,
            "responseDetails": ""
        });
        assert_eq!(parse_response(&body).unwrap(), "Apple");
    }

    #[test]
    fn test_parse_quota_error() {
        let body = json!({
            "responseData": {"translatedText": "MYMEMORY WARNING"},
            "responseStatus": "429",
            "responseDetails": "YOU USED ALL AVAILABLE FREE TRANSLATIONS FOR TODAY"
        });
        assert!(matches!(
            parse_response(&body),
            Err(TranslateError::Status { status: 429, .. })
        ));
    }

    #[test]
    fn test_parse_missing_text() {
        let body = json!({"responseStatus": 200});
        assert!(matches!(
            parse_response(&body),
            Err(TranslateError::MalformedResponse(_))
        ));
    }
}
