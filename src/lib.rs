//! Survey Reconcile - 问卷数据合并与翻译库
//!
//! 这个库提供了两种导出格式的结构对齐、带缓存的俄英翻译、合并输出等核心功能。

pub mod api_constants;
pub mod cache;
pub mod config;
pub mod cyrillic;
pub mod error;
pub mod merge;
pub mod normalize;
pub mod pipeline;
pub mod providers;
pub mod schema;
pub mod stats;
pub mod table;
pub mod translator;
pub mod utils;

pub use error::{ReconcileError, Result};
