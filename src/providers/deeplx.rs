//! DeepLX兼容接口
//!
//! POST `{text, source_lang, target_lang}`，响应中的 `data`、`text` 或 `result`
//! 字段为译文；非JSON响应按纯文本处理。

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::api_constants::{api_config, is_valid_api_url};
use crate::error::Result;
use crate::providers::RemoteTranslator;
use crate::reconcile_error;

#[derive(Debug, Serialize)]
struct DeeplxRequest<'a> {
    text: &'a str,
    source_lang: String,
    target_lang: String,
}

/// DeepLX翻译服务
#[derive(Debug, Clone)]
pub struct DeeplxTranslator {
    client: Client,
    api_url: String,
}

impl DeeplxTranslator {
    pub fn new(api_url: &str, timeout_secs: u64) -> Result<Self> {
        if !is_valid_api_url(api_url) {
            return Err(reconcile_error!(config, "api", format!("无效的API地址: {}", api_url)));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(api_config::DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| reconcile_error!(network, format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            api_url: api_url.to_string(),
        })
    }
}

/// 解析响应文本
pub fn parse_response(response_text: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(response_text) {
        Ok(json_val) => json_val
            .get("data")
            .or_else(|| json_val.get("text"))
            .or_else(|| json_val.get("result"))
            .and_then(|v| v.as_str())
            .unwrap_or(response_text)
            .to_string(),
        Err(_) => response_text.to_string(),
    }
}

#[async_trait]
impl RemoteTranslator for DeeplxTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let request = DeeplxRequest {
            text,
            source_lang: source_lang.to_uppercase(),
            target_lang: target_lang.to_uppercase(),
        };

        let response = self.client.post(&self.api_url).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(reconcile_error!(
                translation_api,
                status.as_u16(),
                body,
                self.api_url
            ));
        }

        let response_text = response.text().await?;
        Ok(parse_response(&response_text))
    }

    fn provider_name(&self) -> &str {
        "DeepLX"
    }
}
