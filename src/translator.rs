//! 翻译适配器
//!
//! 在远程翻译调用外包一层：先查缓存，未命中时按间隔限速后调用，
//! 失败则以原文作为译文写入缓存，同一缓存上不再重试。
//!
//! 批量用法分两遍：先扫描全表收集去重后的俄文字符串，逐条翻译（短的在前，
//! 只为日志可读），再把缓存当作查找表回写每个单元格。远程调用次数因此等于
//! 不同字符串的数量，而不是单元格数量。

// 标准库导入
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

// 第三方crate导入
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::service_config;
use crate::cache::TranslationCache;
use crate::cyrillic::{cell_has_cyrillic, has_cyrillic};
use crate::providers::RemoteTranslator;
use crate::table::Cell;
use crate::utils::truncate_for_log;

/// 单条翻译的结果
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationOutcome {
    /// 无需翻译（空串或不含西里尔字母），返回去除空白后的原文
    Passthrough(String),
    /// 缓存命中
    Cached(String),
    /// 远程翻译成功
    Translated(String),
    /// 远程翻译失败，返回原文
    Fallback { text: String, reason: String },
}

impl TranslationOutcome {
    /// 最终文本
    pub fn into_text(self) -> String {
        match self {
            TranslationOutcome::Passthrough(s)
            | TranslationOutcome::Cached(s)
            | TranslationOutcome::Translated(s) => s,
            TranslationOutcome::Fallback { text, .. } => text,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            TranslationOutcome::Translated(_) | TranslationOutcome::Fallback { .. }
        )
    }
}

/// 适配器统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdapterStats {
    pub passthrough: usize,
    pub cache_hits: usize,
    pub remote_calls: usize,
    pub failures: usize,
}

/// 缓存检查点：每新翻译N条保存一次
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub path: PathBuf,
    pub every: usize,
}

/// 翻译适配器
pub struct TranslatorAdapter {
    backend: Box<dyn RemoteTranslator>,
    source_lang: String,
    target_lang: String,
    delay: Duration,
    checkpoint: Option<Checkpoint>,
    stats: AdapterStats,
}

impl TranslatorAdapter {
    /// 创建适配器（默认 ru → en，无间隔）
    pub fn new(backend: Box<dyn RemoteTranslator>) -> Self {
        Self {
            backend,
            source_lang: service_config::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            delay: Duration::ZERO,
            checkpoint: None,
            stats: AdapterStats::default(),
        }
    }

    /// 设置语言对
    pub fn with_languages(mut self, source: &str, target: &str) -> Self {
        self.source_lang = source.to_string();
        self.target_lang = target.to_string();
        self
    }

    /// 设置每次远程调用前的间隔
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 设置缓存检查点；间隔为0时不启用
    pub fn with_checkpoint(mut self, path: PathBuf, every: usize) -> Self {
        self.checkpoint = (every > 0).then_some(Checkpoint { path, every });
        self
    }

    pub fn stats(&self) -> &AdapterStats {
        &self.stats
    }

    pub fn provider_name(&self) -> &str {
        self.backend.provider_name()
    }

    /// 翻译单条文本，返回最终文本
    pub async fn translate(&mut self, text: &str, cache: &mut TranslationCache) -> String {
        self.translate_detailed(text, cache).await.into_text()
    }

    /// 翻译单条文本，返回带来源的结果
    pub async fn translate_detailed(
        &mut self,
        text: &str,
        cache: &mut TranslationCache,
    ) -> TranslationOutcome {
        let text = text.trim();
        if text.is_empty() || !has_cyrillic(text) {
            self.stats.passthrough += 1;
            return TranslationOutcome::Passthrough(text.to_string());
        }

        if let Some(cached) = cache.get(text) {
            self.stats.cache_hits += 1;
            return TranslationOutcome::Cached(cached.to_string());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.stats.remote_calls += 1;
        match self
            .backend
            .translate(text, &self.source_lang, &self.target_lang)
            .await
        {
            Ok(translated) => {
                // 空结果视同未翻译，保留原文
                let value = if translated.trim().is_empty() {
                    text.to_string()
                } else {
                    translated
                };
                cache.insert(text, value.clone());
                TranslationOutcome::Translated(value)
            }
            Err(e) => {
                self.stats.failures += 1;
                warn!(
                    "  [跳过] {}... -> {}",
                    truncate_for_log(text, service_config::FAILURE_LOG_CHARS),
                    e
                );
                cache.insert(text, text);
                TranslationOutcome::Fallback {
                    text: text.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// 逐条翻译去重后的字符串，短的在前
    ///
    /// 已在缓存中的字符串跳过。返回实际发起远程调用的条数。
    pub async fn translate_all(
        &mut self,
        strings: &HashSet<String>,
        cache: &mut TranslationCache,
    ) -> usize {
        let mut pending: Vec<&String> = strings.iter().filter(|s| !cache.contains(s)).collect();
        pending.sort_by(|a, b| {
            a.chars()
                .count()
                .cmp(&b.chars().count())
                .then_with(|| a.cmp(b))
        });
        self.stats.cache_hits += strings.len() - pending.len();

        info!(
            "🔤 共 {} 条唯一俄文字符串，缓存已覆盖 {} 条，待翻译 {} 条 ({})",
            strings.len(),
            strings.len() - pending.len(),
            pending.len(),
            self.provider_name()
        );

        let total = pending.len();
        let mut attempted = 0;
        for (i, text) in pending.into_iter().enumerate() {
            let outcome = self.translate_detailed(text, cache).await;
            if outcome.is_remote() {
                attempted += 1;
                self.maybe_checkpoint(attempted, cache);
            }
            if let TranslationOutcome::Translated(translated) = &outcome {
                if translated != text.trim() {
                    info!(
                        "  {}/{}: {} -> {}",
                        i + 1,
                        total,
                        truncate_for_log(text, service_config::PROGRESS_LOG_CHARS),
                        truncate_for_log(translated, service_config::PROGRESS_LOG_CHARS)
                    );
                }
            }
        }

        attempted
    }

    /// 收集、翻译并回写，返回被改写的单元格数
    pub async fn translate_rows(
        &mut self,
        rows: &mut [Vec<Cell>],
        cache: &mut TranslationCache,
    ) -> usize {
        let unique = collect_unique(rows.iter());
        self.translate_all(&unique, cache).await;
        apply_cache(rows, cache)
    }

    fn maybe_checkpoint(&self, attempted: usize, cache: &TranslationCache) {
        if let Some(checkpoint) = &self.checkpoint {
            if attempted % checkpoint.every == 0 {
                debug!("缓存检查点: 已翻译 {} 条", attempted);
                cache.save(&checkpoint.path);
            }
        }
    }
}

/// 收集去重后的俄文字符串（去除首尾空白）
pub fn collect_unique<'a, I>(rows: I) -> HashSet<String>
where
    I: IntoIterator<Item = &'a Vec<Cell>>,
{
    rows.into_iter()
        .flat_map(|row| row.iter())
        .filter(|cell| cell_has_cyrillic(cell))
        .filter_map(|cell| cell.as_text())
        .map(|text| text.trim().to_string())
        .collect()
}

/// 以缓存为查找表回写单元格，返回改写数量
///
/// 只改写单元格的值，不改变行的形状。
pub fn apply_cache(rows: &mut [Vec<Cell>], cache: &TranslationCache) -> usize {
    let mut rewritten = 0;
    for cell in rows.iter_mut().flat_map(|row| row.iter_mut()) {
        if !cell_has_cyrillic(cell) {
            continue;
        }
        let Some(translated) = cell.as_text().and_then(|text| cache.get(text)) else {
            continue;
        };
        let translated = translated.to_string();
        if cell.as_text() != Some(translated.as_str()) {
            rewritten += 1;
        }
        *cell = Cell::Text(translated);
    }
    rewritten
}
