/// 流水线常量配置
///
/// 该文件定义了翻译服务、数据源结构和缓存相关的常量，方便统一管理和维护

/// 翻译API配置
pub mod api_config {
    /// Google网页翻译接口（免密钥）
    pub const GOOGLE_WEB_API_URL: &str = "https://translate.googleapis.com/translate_a/single";

    /// 本地DeepLX服务地址
    pub const LOCAL_DEEPLX_URL: &str = "http://localhost:1188/translate";

    /// 默认User-Agent
    pub const DEFAULT_USER_AGENT: &str = "survey-reconcile/0.1.0";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认源语言
    pub const DEFAULT_SOURCE_LANG: &str = "ru";

    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "en";

    /// 默认调用间隔（秒）
    pub const DEFAULT_DELAY_SECS: f64 = 0.2;

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// 失败日志中原文的截断长度
    pub const FAILURE_LOG_CHARS: usize = 50;

    /// 进度日志中原文/译文的截断长度
    pub const PROGRESS_LOG_CHARS: usize = 45;
}

/// 数据源结构配置
pub mod schema_config {
    /// 人口学字段数量（两个数据源一致）
    pub const DEMOGRAPHIC_FIELDS: usize = 5;

    /// 规范布局中的题目字段数量
    pub const CANONICAL_ITEMS: usize = 214;

    /// 旧版导出的题目字段数量
    pub const LEGACY_ITEMS: usize = 205;

    /// 人口学字段名称（规范顺序）
    pub const DEMOGRAPHIC_NAMES: [&str; DEMOGRAPHIC_FIELDS] =
        ["date", "age", "sex", "humanities", "education"];

    /// "未询问"占位值
    pub const UNKNOWN_MARKER: &str = "-";

    /// 来源列标签
    pub const PROVENANCE_LABEL: &str = "source";

    /// 来源列代码
    pub const PROVENANCE_CODE: &str = "";

    /// 旧版导出的来源标记
    pub const LEGACY_TAG: &str = "ART_prestest_responses";

    /// 新版导出的来源标记
    pub const CURRENT_TAG: &str = "pretest_EN";
}

/// 翻译缓存配置
pub mod cache_config {
    /// 合并模式的默认缓存文件名
    pub const DEFAULT_MERGE_CACHE_FILE: &str = "translate_cache_merge.json";

    /// 默认输出文件名
    pub const DEFAULT_MERGE_OUTPUT: &str = "ART_pretest_merged_EN.csv";

    /// 默认检查点间隔（新翻译条数）
    pub const DEFAULT_CHECKPOINT_EVERY: usize = 50;

    /// 预置的固定映射（性别代码）
    pub const SEEDED_ENTRIES: &[(&str, &str)] = &[("Ж", "F"), ("М", "M")];
}

/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// 将秒数转换为调用间隔，拒绝负数、非有限值和超出 `Duration` 范围的值
pub fn delay_from_secs(secs: f64) -> Option<std::time::Duration> {
    if secs < 0.0 {
        return None;
    }
    std::time::Duration::try_from_secs_f64(secs).ok()
}
