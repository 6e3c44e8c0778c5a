//! 翻译缓存模块
//!
//! 持久化的"原文 → 译文"映射：运行开始时显式加载，运行结束时显式保存。
//! 缓存损坏或缺失退化为空缓存；保存失败只告警，不中止流水线。

// 标准库导入
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// 第三方crate导入
use tracing::{debug, info, warn};

// 本地模块导入
use crate::api_constants::cache_config;
use crate::error::Result;
use crate::reconcile_error;

/// 翻译缓存
///
/// 键为去除首尾空白的原文，值总是有内容：翻译失败时以原文作为译文，
/// 同一缓存上不再重试。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationCache {
    entries: BTreeMap<String, String>,
}

impl TranslationCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 从文件加载缓存
    ///
    /// 文件不存在或无法解析时返回空缓存。
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("缓存文件不存在，使用空缓存: {}", path.display());
            return Self::new();
        }

        match Self::try_load(path) {
            Ok(cache) => {
                info!("💾 已加载 {} 条缓存翻译: {}", cache.len(), path.display());
                cache
            }
            Err(e) => {
                warn!("⚠️  无法加载缓存，使用空缓存: {}", e);
                Self::new()
            }
        }
    }

    /// 从文件加载缓存，错误向上传递
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| reconcile_error!(cache_io, path.display(), e))?;
        let raw: Vec<(String, String)> = {
            let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
                .map_err(|e| reconcile_error!(cache_io, path.display(), e))?;
            map.into_iter()
                .map(|(k, v)| match v {
                    serde_json::Value::String(s) => Ok((k, s)),
                    other => Err(reconcile_error!(
                        cache_io,
                        path.display(),
                        format!("键 {:?} 的值不是字符串: {}", k, other)
                    )),
                })
                .collect::<Result<_>>()?
        };

        let mut cache = Self::new();
        for (key, value) in raw {
            let key = key.trim();
            if key.is_empty() || cache.contains(key) {
                continue;
            }
            cache.entries.insert(key.to_string(), value);
        }
        Ok(cache)
    }

    /// 保存缓存；失败时告警并返回false
    pub fn save<P: AsRef<Path>>(&self, path: P) -> bool {
        let path = path.as_ref();
        match self.try_save(path) {
            Ok(()) => {
                info!("💾 已保存翻译缓存 ({} 条): {}", self.len(), path.display());
                true
            }
            Err(e) => {
                warn!("⚠️  无法保存缓存: {}", e);
                false
            }
        }
    }

    /// 保存缓存，错误向上传递
    ///
    /// 先写入同目录的临时文件再重命名，避免中断时留下半截文件。
    pub fn try_save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| reconcile_error!(cache_io, parent.display(), e))?;
        }

        let content = serde_json::to_string_pretty(&self.entries)
            .map_err(|e| reconcile_error!(cache_io, path.display(), e))?;
        let tmp_path = temp_path_for(path);
        fs::write(&tmp_path, content)
            .map_err(|e| reconcile_error!(cache_io, tmp_path.display(), e))?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            reconcile_error!(cache_io, path.display(), e)
        })?;

        debug!("缓存写入完成: {}", path.display());
        Ok(())
    }

    /// 预置固定映射（如性别代码），已存在的键不覆盖
    pub fn seed_defaults(&mut self) {
        for (key, value) in cache_config::SEEDED_ENTRIES {
            self.seed(key, value);
        }
    }

    /// 预置单条映射，已存在时不覆盖；返回是否写入
    pub fn seed(&mut self, source: &str, translated: &str) -> bool {
        let key = source.trim();
        if key.is_empty() || self.contains(key) {
            return false;
        }
        self.entries.insert(key.to_string(), translated.to_string());
        true
    }

    /// 合并另一缓存，已有的值不被覆盖
    pub fn merge_missing(&mut self, other: &TranslationCache) {
        for (key, value) in &other.entries {
            self.seed(key, value);
        }
    }

    /// 查找译文
    pub fn get(&self, source: &str) -> Option<&str> {
        self.entries.get(source.trim()).map(String::as_str)
    }

    /// 是否包含原文
    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source.trim())
    }

    /// 写入译文（覆盖）
    pub fn insert(&mut self, source: &str, translated: impl Into<String>) {
        self.entries.insert(source.trim().to_string(), translated.into());
    }

    /// 条目数量
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按原文顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// 临时文件路径：`cache.json` → `cache.json.tmp`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let cache = TranslationCache::load(dir.path().join("absent.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_gives_empty_cache() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(TranslationCache::load(&path).is_empty());
        assert!(TranslationCache::try_load(&path).is_err());
    }

    #[test]
    fn test_non_string_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("typed.json");
        fs::write(&path, r#"{"нет": 1}"#).unwrap();

        assert!(TranslationCache::load(&path).is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("cache.json");

        let mut cache = TranslationCache::new();
        cache.insert("Донна Тартт", "Donna Tartt");
        cache.insert("нет", "no");
        assert!(cache.save(&path));

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Донна Тартт"), "non-ASCII written verbatim");
        assert!(!dir.path().join("sub").join("cache.json.tmp").exists());

        let loaded = TranslationCache::load(&path);
        assert_eq!(loaded, cache);
    }

    #[test]
    fn test_loaded_keys_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        fs::write(&path, r#"{"  да ": "yes"}"#).unwrap();

        let cache = TranslationCache::load(&path);
        assert_eq!(cache.get("да"), Some("yes"));
        assert_eq!(cache.get(" да  "), Some("yes"));
    }

    #[test]
    fn test_seed_does_not_override_loaded() {
        let mut cache = TranslationCache::new();
        cache.insert("Ж", "Female");
        cache.seed_defaults();

        assert_eq!(cache.get("Ж"), Some("Female"));
        assert_eq!(cache.get("М"), Some("M"));
    }

    #[test]
    fn test_merge_missing_keeps_existing() {
        let mut loaded = TranslationCache::new();
        loaded.insert("да", "yes");
        let mut fresh = TranslationCache::new();
        fresh.insert("да", "right");
        fresh.insert("нет", "no");

        loaded.merge_missing(&fresh);
        assert_eq!(loaded.get("да"), Some("yes"));
        assert_eq!(loaded.get("нет"), Some("no"));
    }

    #[test]
    fn test_save_failure_is_reported_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        // 目标路径是已存在的目录，重命名必然失败
        let path = dir.path().join("occupied");
        fs::create_dir_all(path.join("inner")).unwrap();

        let mut cache = TranslationCache::new();
        cache.insert("да", "yes");
        assert!(!cache.save(&path));
        assert_eq!(cache.len(), 1);
    }
}
