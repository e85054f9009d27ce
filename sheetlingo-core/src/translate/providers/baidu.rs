//! Baidu general translation API (app id + secret key, MD5-signed requests)

use super::check_status;
use crate::translate::{Direction, TranslateError, Translator, ensure_not_blank};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

const API_URL: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate";

pub struct BaiduTranslator {
    client: Client,
    appid: String,
    key: String,
    from: &'static str,
    to: &'static str,
}

#[derive(Debug, Deserialize)]
struct BaiduResponse {
    #[serde(default)]
    trans_result: Vec<TransResult>,
    error_code: Option<String>,
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransResult {
    dst: String,
}

impl BaiduTranslator {
    pub fn new(client: Client, direction: Direction, appid: String, key: String) -> Self {
        let (from, to) = match direction {
            Direction::ZhToEn => ("zh", "en"),
            Direction::EnToZh => ("en", "zh"),
        };
        Self {
            client,
            appid,
            key,
            from,
            to,
        }
    }
}

impl Translator for BaiduTranslator {
    fn name(&self) -> &str {
        "baidu"
    }

    fn translate(&self, text: &str) -> Result<String, TranslateError> {
        ensure_not_blank(text)?;

        let salt = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default()
            .to_string();
        let signature = sign(&self.appid, text, &salt, &self.key);

        let response = self
            .client
            .post(API_URL)
            .form(&[
                ("q", text),
                ("from", self.from),
                ("to", self.to),
                ("appid", self.appid.as_str()),
                ("salt", salt.as_str()),
                ("sign", signature.as_str()),
            ])
            .send()?;
        let body: BaiduResponse = check_status(response)?.json()?;
        parse_response(body)
    }
}

/// `md5(appid + q + salt + key)` as lowercase hex
pub fn sign(appid: &str, query: &str, salt: &str, key: &str) -> String {
    format!("{:x}", md5::compute(format!("{}{}{}{}", appid, query, salt, key)))
}

fn parse_response(body: BaiduResponse) -> Result<String, TranslateError> {
    if let Some(code) = body.error_code.filter(|c| c != "52000") {
        let message = format!("{} {}", code, body.error_msg.unwrap_or_default());
        // Unauthorized user, bad signature, bad client IP, bad appid, unverified account
        return match code.as_str() {
            "52003" | "54001" | "58000" | "58001" | "90107" => Err(TranslateError::Auth(message)),
            _ => Err(TranslateError::MalformedResponse(message)),
        };
    }

    if body.trans_result.is_empty() {
        return Err(TranslateError::MalformedResponse(
            "empty trans_result".to_string(),
        ));
    }

    // Multi-line input comes back as one entry per line
    Ok(body
        .trans_result
        .into_iter()
        .map(|r| r.dst)
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_matches_documented_example() {
        assert_eq!(
            sign("2015063000000001", "apple", "1435660288", "12345678"),
            "f89f9594663708c1605f3d736d01d2d4"
        );
    }

    #[test]
    fn test_parse_success() {
        let body: BaiduResponse = serde_json::from_str(
            r#"{"from":"zh","to":"en","trans_result":[{"src":"苹果","dst":"Apple"},{"src":"香蕉","dst":"Banana"}]}"#,
        )
        .unwrap();
        assert_eq!(parse_response(body).unwrap(), "Apple\nBanana");
    }

    #[test]
    fn test_parse_error_codes() {
        let body: BaiduResponse =
            serde_json::from_str(r#"{"error_code":"54001","error_msg":"Invalid Sign"}"#).unwrap();
        assert!(matches!(parse_response(body), Err(TranslateError::Auth(_))));

        let body: BaiduResponse =
            serde_json::from_str(r#"{"error_code":"54003","error_msg":"Invalid Access Limit"}"#)
                .unwrap();
        assert!(matches!(
            parse_response(body),
            Err(TranslateError::MalformedResponse(_))
        ));
    }
}
