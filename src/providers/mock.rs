//! 测试用翻译服务
//!
//! 不访问网络，结果确定；记录调用次数以验证缓存与去重行为。
//! `MockMode::Echo` 也用于 `--provider noop` 的离线演练。

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::providers::RemoteTranslator;
use crate::reconcile_error;

/// 模拟模式
#[derive(Debug, Clone)]
pub enum MockMode {
    /// 预定义映射；未命中时原样返回
    Mappings(HashMap<String, String>),
    /// 原样返回
    Echo,
    /// 返回空串（模拟接口返回空结果）
    Empty,
    /// 总是失败
    Error(String),
}

/// 模拟翻译服务
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    calls: Arc<AtomicUsize>,
}

impl MockTranslator {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// 以 (原文, 译文) 列表构造映射模式
    pub fn with_mappings<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let map = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self::new(MockMode::Mappings(map))
    }

    /// 已发生的调用次数
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteTranslator for MockTranslator {
    async fn translate(&self, text: &str, _source_lang: &str, _target_lang: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.mode {
            MockMode::Mappings(map) => Ok(map.get(text).cloned().unwrap_or_else(|| text.to_string())),
            MockMode::Echo => Ok(text.to_string()),
            MockMode::Empty => Ok(String::new()),
            MockMode::Error(msg) => Err(reconcile_error!(network, msg)),
        }
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}
