use std::time::Duration;

use chrono::{DateTime, Local};

use crate::translator::AdapterStats;

/// 流水线运行统计
#[derive(Debug, Clone)]
pub struct PipelineStats {
    pub started_at: DateTime<Local>,
    pub read_time: Duration,
    pub align_time: Duration,
    pub translation_time: Duration,
    pub write_time: Duration,
    /// (来源标记, 行数)
    pub rows_per_source: Vec<(String, usize)>,
    pub output_rows: usize,
    pub output_columns: usize,
    pub unique_strings: usize,
    pub cells_rewritten: usize,
    pub cache_entries: usize,
    pub cache_saved: bool,
    pub categorical_passed_through: usize,
    pub adapter: AdapterStats,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self {
            started_at: Local::now(),
            read_time: Duration::ZERO,
            align_time: Duration::ZERO,
            translation_time: Duration::ZERO,
            write_time: Duration::ZERO,
            rows_per_source: Vec::new(),
            output_rows: 0,
            output_columns: 0,
            unique_strings: 0,
            cells_rewritten: 0,
            cache_entries: 0,
            cache_saved: false,
            categorical_passed_through: 0,
            adapter: AdapterStats::default(),
        }
    }
}

impl Default for PipelineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// 打印运行统计
pub fn print_stats_report(stats: &PipelineStats, total_duration: Duration) {
    println!("\n📊 运行统计报告:");
    println!("═══════════════════════════════════════");
    println!("   开始时间: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S"));

    // 时间分解
    println!("⏱️  时间分解:");
    println!("   文件读取: {}", format_duration(stats.read_time));
    println!("   结构对齐: {}", format_duration(stats.align_time));
    println!("   翻译执行: {}", format_duration(stats.translation_time));
    println!("   文件写入: {}", format_duration(stats.write_time));
    println!("   总耗时: {}", format_duration(total_duration));

    // 数据统计
    println!("\n📏 数据统计:");
    for (source, rows) in &stats.rows_per_source {
        println!("   {}: {} 行", source, rows);
    }
    println!(
        "   输出: {} 行 x {} 列",
        stats.output_rows, stats.output_columns
    );
    if stats.categorical_passed_through > 0 {
        println!(
            "   未识别的分类取值: {} 个（原样保留）",
            stats.categorical_passed_through
        );
    }

    // 翻译统计
    println!("\n🔤 翻译统计:");
    println!("   唯一俄文字符串: {} 条", stats.unique_strings);
    println!("   远程调用: {} 次", stats.adapter.remote_calls);
    println!("   调用失败(保留原文): {} 次", stats.adapter.failures);
    println!("   改写单元格: {} 个", stats.cells_rewritten);

    // 缓存统计
    let lookups = stats.adapter.cache_hits + stats.adapter.remote_calls;
    println!("\n💾 缓存统计:");
    println!("   缓存条目: {} 条", stats.cache_entries);
    println!("   缓存命中: {} 次", stats.adapter.cache_hits);
    if lookups > 0 {
        println!(
            "   命中率: {:.1}%",
            stats.adapter.cache_hits as f64 / lookups as f64 * 100.0
        );
    }
    println!(
        "   持久化: {}",
        if stats.cache_saved { "✅ 已保存" } else { "⚠️  未保存" }
    );
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}
