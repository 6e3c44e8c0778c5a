//! 远程翻译服务
//!
//! `RemoteTranslator` 把具体服务（Google网页接口、DeepLX、测试用mock）与
//! 缓存/限速逻辑解耦。本层不做重试：一次失败即交给上层回退。

pub mod deeplx;
pub mod google;
pub mod mock;

use async_trait::async_trait;

use crate::error::Result;

pub use deeplx::DeeplxTranslator;
pub use google::GoogleTranslator;
pub use mock::{MockMode, MockTranslator};

/// 远程翻译调用
#[async_trait]
pub trait RemoteTranslator: Send + Sync {
    /// 翻译单条文本
    ///
    /// 返回的译文可能为空串，调用方负责处理。
    async fn translate(&self, text: &str, source_lang: &str, target_lang: &str) -> Result<String>;

    /// 服务名称，用于日志
    fn provider_name(&self) -> &str;
}
