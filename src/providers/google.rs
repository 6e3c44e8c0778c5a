//! Google网页翻译接口
//!
//! 使用免密钥的 `translate_a/single` 接口（client=gtx, dt=t）。
//! 响应为嵌套数组，第一个元素是若干 `[译文片段, 原文片段, ...]`。

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use url::Url;

use crate::api_constants::{api_config, service_config};
use crate::error::Result;
use crate::providers::RemoteTranslator;
use crate::reconcile_error;

/// Google网页翻译
#[derive(Debug, Clone)]
pub struct GoogleTranslator {
    client: Client,
    base_url: String,
}

impl GoogleTranslator {
    /// 使用默认地址与超时创建
    pub fn new() -> Result<Self> {
        Self::with_options(
            api_config::GOOGLE_WEB_API_URL,
            service_config::REQUEST_TIMEOUT_SECONDS,
        )
    }

    /// 自定义地址与超时（秒）
    pub fn with_options(base_url: &str, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(api_config::DEFAULT_USER_AGENT)
            .build()
            .map_err(|e| reconcile_error!(network, format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// 构造请求地址
    fn request_url(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.base_url,
            &[
                ("client", "gtx"),
                ("sl", source_lang),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ],
        )
        .map_err(|e| reconcile_error!(config, "api_url", e))
    }
}

/// 从响应中拼接译文片段
pub fn parse_response(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let translated: String = segments
        .iter()
        .filter_map(|segment| segment.get(0).and_then(Value::as_str))
        .collect();
    Some(translated)
}

#[async_trait]
impl RemoteTranslator for GoogleTranslator {
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String> {
        let url = self.request_url(text, source_lang, target_lang)?;
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(reconcile_error!(
                translation_api,
                status.as_u16(),
                body,
                self.base_url
            ));
        }

        let body: Value = response.json().await?;
        parse_response(&body).ok_or_else(|| {
            reconcile_error!(
                translation_api,
                200,
                "响应格式无效: 缺少译文数组",
                self.base_url
            )
        })
    }

    fn provider_name(&self) -> &str {
        "Google Translate"
    }
}
