// 标准库导入
use std::path::{Path, PathBuf};

// 本地模块导入
use crate::error::Result;
use crate::reconcile_error;

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证输入文件存在且是普通文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(reconcile_error!(input_validation, path.display(), "文件不存在"));
    }

    if !path.is_file() {
        return Err(reconcile_error!(input_validation, path.display(), "路径不是文件"));
    }

    Ok(())
}

/// 生成翻译输出路径: `input.csv` → `input_EN.csv`
pub fn generate_output_path(input: &Path, output: Option<&Path>, lang: &str) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.to_path_buf();
    }

    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let output_name = match input.extension() {
        Some(ext) => format!("{}_{}.{}", stem, lang.to_uppercase(), ext.to_string_lossy()),
        None => format!("{}_{}", stem, lang.to_uppercase()),
    };

    match input.parent() {
        Some(parent) => parent.join(output_name),
        None => PathBuf::from(output_name),
    }
}

/// 日志用的截断显示：按字符截断并带引号转义
pub fn truncate_for_log(text: &str, max_chars: usize) -> String {
    let truncated: String = text.chars().take(max_chars).collect();
    format!("{:?}", truncated)
}
