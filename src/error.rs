//! 统一错误处理模块
//!
//! 提供问卷合并流水线的统一错误类型定义和处理机制

// 标准库导入
use std::fmt;

// 第三方crate导入
use anyhow::Error as AnyhowError;

/// 流水线统一错误类型
///
/// 区分致命错误（结构/配置错误，立即中止）与可恢复错误（缓存读写、单条翻译失败）
#[derive(Debug)]
pub enum ReconcileError {
    /// 网络请求相关错误
    Network {
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>,
    },

    /// 翻译API相关错误
    TranslationApi {
        /// API响应状态码
        status_code: u16,
        /// 错误消息
        message: String,
        /// API地址
        api_url: String,
    },

    /// 文件操作相关错误
    FileOperation {
        /// 文件路径
        path: String,
        /// 操作类型（读取、写入、创建等）
        operation: String,
        /// 底层错误信息
        source: String,
    },

    /// 配置相关错误
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },

    /// 输入验证错误（缺少输入文件、行宽不齐等）
    InputValidation {
        /// 输入值
        input: String,
        /// 验证失败原因
        reason: String,
    },

    /// 数据源列数与描述不符
    SchemaMismatch {
        /// 数据源名称
        source_name: String,
        /// 期望列数
        expected: usize,
        /// 实际列数
        actual: usize,
    },

    /// 翻译缓存读写错误
    CacheIo {
        /// 缓存文件路径
        path: String,
        /// 错误详情
        details: String,
    },

    /// 内部处理错误（包装anyhow::Error）
    Internal {
        /// 包装的错误
        source: AnyhowError,
    },
}

impl ReconcileError {
    /// 是否为致命错误
    ///
    /// 结构与配置错误意味着数据源格式已变化，必须中止；
    /// 缓存与翻译错误只降级处理。
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            ReconcileError::Network { .. }
                | ReconcileError::TranslationApi { .. }
                | ReconcileError::CacheIo { .. }
        )
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcileError::Network { message, status_code } => {
                if let Some(code) = status_code {
                    write!(f, "网络请求失败 [{}]: {}", code, message)
                } else {
                    write!(f, "网络请求失败: {}", message)
                }
            }
            ReconcileError::TranslationApi { status_code, message, api_url } => {
                write!(f, "翻译API错误 [{}] {}: {}", status_code, api_url, message)
            }
            ReconcileError::FileOperation { path, operation, source } => {
                write!(f, "文件{}操作失败 [{}]: {}", operation, path, source)
            }
            ReconcileError::Configuration { field, reason } => {
                write!(f, "配置错误 [{}]: {}", field, reason)
            }
            ReconcileError::InputValidation { input, reason } => {
                write!(f, "输入验证失败 [{}]: {}", input, reason)
            }
            ReconcileError::SchemaMismatch { source_name, expected, actual } => {
                write!(
                    f,
                    "数据源结构不符 [{}]: 期望 {} 列, 实际 {} 列",
                    source_name, expected, actual
                )
            }
            ReconcileError::CacheIo { path, details } => {
                write!(f, "翻译缓存读写失败 [{}]: {}", path, details)
            }
            ReconcileError::Internal { source } => {
                write!(f, "内部处理错误: {}", source)
            }
        }
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReconcileError::Internal { source } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// 流水线结果类型别名
pub type Result<T> = std::result::Result<T, ReconcileError>;

/// 便捷的错误创建宏
#[macro_export]
macro_rules! reconcile_error {
    (network, $msg:expr) => {
        $crate::error::ReconcileError::Network {
            message: $msg.to_string(),
            status_code: None,
        }
    };
    (network, $msg:expr, $code:expr) => {
        $crate::error::ReconcileError::Network {
            message: $msg.to_string(),
            status_code: Some($code),
        }
    };
    (translation_api, $code:expr, $msg:expr, $url:expr) => {
        $crate::error::ReconcileError::TranslationApi {
            status_code: $code,
            message: $msg.to_string(),
            api_url: $url.to_string(),
        }
    };
    (file_op, $path:expr, $op:expr, $source:expr) => {
        $crate::error::ReconcileError::FileOperation {
            path: $path.to_string(),
            operation: $op.to_string(),
            source: $source.to_string(),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::ReconcileError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
    (input_validation, $input:expr, $reason:expr) => {
        $crate::error::ReconcileError::InputValidation {
            input: $input.to_string(),
            reason: $reason.to_string(),
        }
    };
    (schema, $name:expr, $expected:expr, $actual:expr) => {
        $crate::error::ReconcileError::SchemaMismatch {
            source_name: $name.to_string(),
            expected: $expected,
            actual: $actual,
        }
    };
    (cache_io, $path:expr, $details:expr) => {
        $crate::error::ReconcileError::CacheIo {
            path: $path.to_string(),
            details: $details.to_string(),
        }
    };
}

/// 从anyhow::Error转换为ReconcileError
impl From<AnyhowError> for ReconcileError {
    fn from(error: AnyhowError) -> Self {
        ReconcileError::Internal { source: error }
    }
}

/// 从reqwest::Error转换为ReconcileError
impl From<reqwest::Error> for ReconcileError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        ReconcileError::Network {
            message: error.to_string(),
            status_code,
        }
    }
}

/// 从std::io::Error转换为ReconcileError
impl From<std::io::Error> for ReconcileError {
    fn from(error: std::io::Error) -> Self {
        ReconcileError::FileOperation {
            path: "unknown".to_string(),
            operation: "io".to_string(),
            source: error.to_string(),
        }
    }
}

/// 从csv::Error转换为ReconcileError
impl From<csv::Error> for ReconcileError {
    fn from(error: csv::Error) -> Self {
        let line = error
            .position()
            .map(|p| format!("第{}行", p.line()))
            .unwrap_or_else(|| "unknown".to_string());
        ReconcileError::InputValidation {
            input: line,
            reason: error.to_string(),
        }
    }
}

/// 从serde_json::Error转换为ReconcileError
impl From<serde_json::Error> for ReconcileError {
    fn from(error: serde_json::Error) -> Self {
        ReconcileError::Internal {
            source: AnyhowError::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReconcileError::Network {
            message: "Connection failed".to_string(),
            status_code: Some(500),
        };

        assert_eq!(format!("{}", err), "网络请求失败 [500]: Connection failed");
    }

    #[test]
    fn test_schema_mismatch_display() {
        let err = reconcile_error!(schema, "legacy", 210, 209);
        assert_eq!(
            err.to_string(),
            "数据源结构不符 [legacy]: 期望 210 列, 实际 209 列"
        );
    }

    #[test]
    fn test_error_macro() {
        let err = reconcile_error!(network, "Test error", 404);
        match err {
            ReconcileError::Network { message, status_code } => {
                assert_eq!(message, "Test error");
                assert_eq!(status_code, Some(404));
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_fatal_classification() {
        assert!(reconcile_error!(schema, "x", 1, 2).is_fatal());
        assert!(reconcile_error!(config, "delay", "negative").is_fatal());
        assert!(reconcile_error!(input_validation, "a.csv", "missing").is_fatal());
        assert!(!reconcile_error!(cache_io, "c.json", "denied").is_fatal());
        assert!(!reconcile_error!(network, "timeout").is_fatal());
        assert!(!reconcile_error!(translation_api, 429, "slow down", "http://x").is_fatal());
    }

    #[test]
    fn test_anyhow_conversion() {
        let anyhow_err = anyhow::anyhow!("Test anyhow error");
        let err: ReconcileError = anyhow_err.into();

        match err {
            ReconcileError::Internal { .. } => {}
            _ => panic!("Wrong error type"),
        }
    }
}
