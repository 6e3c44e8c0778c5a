//! 流水线编排
//!
//! 合并模式：读取两份导出 → 结构对齐 → 加载缓存并预置固定映射 → 收集唯一俄文字符串并翻译
//! → 保存缓存 → 回写 → 合并 → 写出。
//! 翻译模式：对单个表格（含表头）做同样的翻译，形状不变。

// 标准库导入
use std::path::Path;
use std::time::Instant;

// 第三方crate导入
use tracing::info;

// 本地模块导入
use crate::cache::TranslationCache;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::merge::{merge, MergedTable};
use crate::normalize::{CategoryTable, NormalizeReport};
use crate::providers::RemoteTranslator;
use crate::schema::SchemaAligner;
use crate::stats::PipelineStats;
use crate::table::{read_table, write_table};
use crate::translator::{apply_cache, collect_unique, TranslatorAdapter};
use crate::utils::validate_input_file;

/// 按配置创建翻译适配器
pub fn build_adapter(
    config: &PipelineConfig,
    backend: Box<dyn RemoteTranslator>,
) -> TranslatorAdapter {
    let adapter = TranslatorAdapter::new(backend)
        .with_languages(config.source_lang(), config.target_lang())
        .with_delay(config.delay());
    match config.cache_path() {
        Some(path) => adapter.with_checkpoint(path.to_path_buf(), config.checkpoint_every()),
        None => adapter,
    }
}

/// 加载缓存（若配置了路径）并预置固定映射
fn load_cache(config: &PipelineConfig) -> TranslationCache {
    let mut cache = config
        .cache_path()
        .map(TranslationCache::load)
        .unwrap_or_default();
    cache.seed_defaults();
    cache
}

/// 保存缓存（若配置了路径）
fn save_cache(config: &PipelineConfig, cache: &TranslationCache) -> bool {
    config.cache_path().is_some_and(|path| cache.save(path))
}

/// 合并两份导出并翻译
///
/// 输入文件缺失、列数不符为致命错误；缓存读写与单条翻译失败只降级。
pub async fn run_merge(
    config: &PipelineConfig,
    legacy_path: &Path,
    current_path: &Path,
    output_path: &Path,
    backend: Box<dyn RemoteTranslator>,
) -> Result<(MergedTable, PipelineStats)> {
    let mut stats = PipelineStats::new();

    validate_input_file(legacy_path)?;
    validate_input_file(current_path)?;

    let read_start = Instant::now();
    info!("📂 读取新版导出（结构与A部分）: {}", current_path.display());
    let current_raw = read_table(current_path)?;
    info!("📂 读取旧版导出（B部分）: {}", legacy_path.display());
    let legacy_raw = read_table(legacy_path)?;
    stats.read_time = read_start.elapsed();

    let align_start = Instant::now();
    let aligner = SchemaAligner::new(config.layout().clone(), CategoryTable::reference());
    let mut report = NormalizeReport::default();
    let mut legacy = aligner.align(&legacy_raw, config.legacy(), &mut report)?;
    let mut current = aligner.align(&current_raw, config.current(), &mut report)?;
    stats.align_time = align_start.elapsed();
    stats.categorical_passed_through = report.passed_through;

    let translate_start = Instant::now();
    let mut cache = load_cache(config);
    let mut adapter = build_adapter(config, backend);

    let unique = collect_unique(legacy.rows.iter().chain(current.rows.iter()));
    stats.unique_strings = unique.len();
    adapter.translate_all(&unique, &mut cache).await;
    stats.cache_saved = save_cache(config, &cache);

    stats.cells_rewritten =
        apply_cache(&mut legacy.rows, &cache) + apply_cache(&mut current.rows, &cache);
    stats.translation_time = translate_start.elapsed();
    stats.adapter = adapter.stats().clone();
    stats.cache_entries = cache.len();

    stats.rows_per_source = vec![
        (legacy.provenance.clone(), legacy.rows.len()),
        (current.provenance.clone(), current.rows.len()),
    ];
    let merged = merge(&[legacy, current], config.layout().width())?;

    let write_start = Instant::now();
    info!(
        "📄 写入 {} ({} 行, {} 列)...",
        output_path.display(),
        merged.rows.len(),
        merged.width()
    );
    write_table(output_path, &merged.to_rows())?;
    stats.write_time = write_start.elapsed();
    stats.output_rows = merged.rows.len();
    stats.output_columns = merged.width();

    Ok((merged, stats))
}

/// 翻译单个表格中的全部俄文内容（含表头行），输出形状与输入一致
pub async fn run_translate(
    config: &PipelineConfig,
    input_path: &Path,
    output_path: &Path,
    backend: Box<dyn RemoteTranslator>,
) -> Result<PipelineStats> {
    let mut stats = PipelineStats::new();

    validate_input_file(input_path)?;

    let read_start = Instant::now();
    info!("📂 读取 {} ...", input_path.display());
    let mut table = read_table(input_path)?;
    stats.read_time = read_start.elapsed();
    stats.rows_per_source = vec![(input_path.display().to_string(), table.height())];

    let translate_start = Instant::now();
    let mut cache = load_cache(config);
    let mut adapter = build_adapter(config, backend);

    let unique = collect_unique(table.rows.iter());
    stats.unique_strings = unique.len();
    info!("🔍 发现 {} 条唯一俄文字符串", unique.len());
    adapter.translate_all(&unique, &mut cache).await;
    stats.cache_saved = save_cache(config, &cache);

    stats.cells_rewritten = apply_cache(&mut table.rows, &cache);
    stats.translation_time = translate_start.elapsed();
    stats.adapter = adapter.stats().clone();
    stats.cache_entries = cache.len();

    let write_start = Instant::now();
    info!("📄 写入 {} ...", output_path.display());
    write_table(output_path, &table.rows)?;
    stats.write_time = write_start.elapsed();
    stats.output_rows = table.height();
    stats.output_columns = table.width();

    Ok(stats)
}
