//! DeepSeek chat-completions API used as a translator

use super::check_status;
use crate::translate::{Direction, TranslateError, Translator, ensure_not_blank};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-chat";
const TEMPERATURE: f32 = 0.3;

pub struct DeepSeekTranslator {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    system_prompt: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

impl DeepSeekTranslator {
    pub fn new(
        client: Client,
        direction: Direction,
        api_key: String,
        api_url: String,
        model: String,
    ) -> Self {
        Self {
            client,
            api_key,
            api_url,
            model,
            system_prompt: build_system_prompt(direction),
        }
    }
}

fn build_system_prompt(direction: Direction) -> String {
    format!(
        "You are a professional translator. Translate the following {} text into {}. \
         Return only the translation, without explanations or extra text. \
         Keep every [SEP] marker exactly where it is.",
        direction.source().as_str(),
        direction.target().as_str()
    )
}

impl Translator for DeepSeekTranslator {
    fn name(&self) -> &str {
        "deepseek"
    }

    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        ensure_not_blank(text)?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &self.system_prompt,
                },
                Message {
                    role: "user",
                    content: text,
                },
            ],
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;
        let body: ChatResponse = check_status(response)?.json()?;
        parse_response(body)
    }

    fn accepts_long_input(&self) -> bool {
        true
    }
}

fn parse_response(body: ChatResponse) -> Result<String, TranslateError> {
    let content = body
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| TranslateError::MalformedResponse("no choices".to_string()))?;

    let content = content.trim();
    if content.is_empty() {
        return Err(TranslateError::MalformedResponse(
            "empty completion".to_string(),
        ));
    }
    Ok(content.to_string())
}
