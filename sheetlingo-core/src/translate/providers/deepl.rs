//! DeepL REST API

use super::check_status;
use crate::translate::{Direction, TranslateError, Translator, ensure_not_blank};
use reqwest::blocking::Client;
use serde::Deserialize;

const FREE_API_URL: &str = "https://api-free.deepl.com/v2/translate";
const PRO_API_URL: &str = "https://api.deepl.com/v2/translate";

pub struct DeepLTranslator {
    client: Client,
    auth_key: String,
    source_lang: &'static str,
    target_lang: &'static str,
}

#[derive(Debug, Deserialize)]
struct DeepLResponse {
    translations: Vec<DeepLTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeepLTranslation {
    text: String,
}

impl DeepLTranslator {
    pub fn new(client: Client, direction: Direction, auth_key: String) -> Self {
        let (source_lang, target_lang) = match direction {
            Direction::ZhToEn => ("ZH", "EN-US"),
            Direction::EnToZh => ("EN", "ZH"),
        };
        Self {
            client,
            auth_key,
            source_lang,
            target_lang,
        }
    }

    fn endpoint(&self) -> &'static str {
        endpoint_for_key(&self.auth_key)
    }
}

/// Free-plan keys carry a `:fx` suffix and live on a separate host
fn endpoint_for_key(auth_key: &str) -> &'static str {
    if auth_key.ends_with(":fx") {
        FREE_API_URL
    } else {
        PRO_API_URL
    }
}

impl Translator for DeepLTranslator {
    fn name(&self) -> &str {
        "deepl"
    }

    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        ensure_not_blank(text)?;

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("DeepL-Auth-Key {}", self.auth_key))
            .form(&[
                ("text", text),
                ("source_lang", self.source_lang),
                ("target_lang", self.target_lang),
            ])
            .send()?;
        let body: DeepLResponse = check_status(response)?.json()?;

        body.translations
            .into_iter()
            .next()
            .map(|t| t.text)
            .ok_or_else(|| TranslateError::MalformedResponse("empty translations".to_string()))
    }
}
