//! 配置管理模块
//!
//! 提供CLI参数解析和流水线配置管理功能

// 标准库导入
use std::path::{Path, PathBuf};
use std::time::Duration;

// 第三方crate导入
use clap::{Args, Parser, Subcommand, ValueEnum};

// 本地模块导入
use crate::api_constants::{
    api_config, cache_config, delay_from_secs, is_valid_api_url, service_config,
};
use crate::error::Result;
use crate::providers::{
    DeeplxTranslator, GoogleTranslator, MockMode, MockTranslator, RemoteTranslator,
};
use crate::reconcile_error;
use crate::schema::{CanonicalLayout, DatasetDescriptor};

/// 流水线配置结构体
///
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use std::time::Duration;
/// use survey_reconcile::config::PipelineConfig;
///
/// let config = PipelineConfig::new()
///     .with_delay(Duration::from_millis(500))
///     .with_languages("ru", "en")
///     .with_checkpoint_every(100);
/// assert_eq!(config.checkpoint_every(), 100);
/// ```
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// 每次远程调用前的间隔
    delay: Duration,
    /// 源语言代码
    source_lang: String,
    /// 目标语言代码
    target_lang: String,
    /// 缓存文件路径；None 表示仅在内存中缓存
    cache_path: Option<PathBuf>,
    /// 检查点间隔（新翻译条数，0为不启用）
    checkpoint_every: usize,
    /// 规范布局
    layout: CanonicalLayout,
    /// 旧版数据源描述
    legacy: DatasetDescriptor,
    /// 新版数据源描述
    current: DatasetDescriptor,
}

impl PipelineConfig {
    /// 创建新的配置实例
    ///
    /// 默认值：
    /// - 调用间隔: 0.2秒
    /// - 语言: ru → en
    /// - 缓存: 不持久化
    /// - 检查点: 每50条
    /// - 参考布局与两份参考数据源描述
    pub fn new() -> Self {
        Self {
            delay: Duration::from_millis(200),
            source_lang: service_config::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            cache_path: None,
            checkpoint_every: cache_config::DEFAULT_CHECKPOINT_EVERY,
            layout: CanonicalLayout::reference(),
            legacy: DatasetDescriptor::legacy(),
            current: DatasetDescriptor::current(),
        }
    }

    /// 获取调用间隔
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// 获取源语言
    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    /// 获取目标语言
    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    /// 获取缓存路径
    pub fn cache_path(&self) -> Option<&Path> {
        self.cache_path.as_deref()
    }

    /// 获取检查点间隔
    pub fn checkpoint_every(&self) -> usize {
        self.checkpoint_every
    }

    pub fn layout(&self) -> &CanonicalLayout {
        &self.layout
    }

    pub fn legacy(&self) -> &DatasetDescriptor {
        &self.legacy
    }

    pub fn current(&self) -> &DatasetDescriptor {
        &self.current
    }

    /// 设置调用间隔
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// 设置语言对
    pub fn with_languages(mut self, source: &str, target: &str) -> Self {
        self.source_lang = source.to_string();
        self.target_lang = target.to_string();
        self
    }

    /// 设置缓存路径
    pub fn with_cache_path(mut self, path: Option<PathBuf>) -> Self {
        self.cache_path = path;
        self
    }

    /// 设置检查点间隔
    pub fn with_checkpoint_every(mut self, every: usize) -> Self {
        self.checkpoint_every = every;
        self
    }

    /// 设置规范布局与数据源描述
    pub fn with_schema(
        mut self,
        layout: CanonicalLayout,
        legacy: DatasetDescriptor,
        current: DatasetDescriptor,
    ) -> Self {
        self.layout = layout;
        self.legacy = legacy;
        self.current = current;
        self
    }

    /// 从命令行参数构建配置
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let (delay_secs, cache_path, checkpoint_every) = match &cli.command {
            Command::Merge(args) => (
                args.delay,
                Some(args.cache.clone().unwrap_or_else(|| default_merge_cache(&args.out))),
                args.checkpoint_every,
            ),
            Command::Translate(args) => (args.delay, args.cache.clone(), args.checkpoint_every),
        };

        let delay = delay_from_secs(delay_secs).ok_or_else(|| {
            reconcile_error!(config, "delay", format!("调用间隔必须为非负有限值: {}", delay_secs))
        })?;

        Ok(Self::new()
            .with_delay(delay)
            .with_languages(&cli.source_lang, &cli.target_lang)
            .with_cache_path(cache_path)
            .with_checkpoint_every(checkpoint_every))
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// 合并模式默认缓存路径：输出文件同目录下的 translate_cache_merge.json
pub fn default_merge_cache(output: &Path) -> PathBuf {
    match output.parent() {
        Some(parent) => parent.join(cache_config::DEFAULT_MERGE_CACHE_FILE),
        None => PathBuf::from(cache_config::DEFAULT_MERGE_CACHE_FILE),
    }
}

/// 翻译服务
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Provider {
    /// Google网页翻译（免密钥）
    Google,
    /// DeepLX兼容接口
    Deeplx,
    /// 离线演练：不联网，所有文本保留原文
    Noop,
}

/// CLI参数结构
#[derive(Parser)]
#[command(author, version, about = "问卷数据合并与俄英翻译工具 - 带持久化翻译缓存", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 翻译服务
    #[arg(long, value_enum, default_value_t = Provider::Google, global = true)]
    pub provider: Provider,

    /// 翻译API地址（DeepLX模式）
    #[arg(short, long, global = true)]
    pub api: Option<String>,

    /// 源语言代码
    #[arg(long, default_value = service_config::DEFAULT_SOURCE_LANG, global = true)]
    pub source_lang: String,

    /// 目标语言代码
    #[arg(long, default_value = service_config::DEFAULT_TARGET_LANG, global = true)]
    pub target_lang: String,

    /// 请求超时时间（秒）
    #[arg(long, default_value_t = service_config::REQUEST_TIMEOUT_SECONDS, global = true)]
    pub timeout: u64,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// 显示运行统计
    #[arg(long, global = true)]
    pub stats: bool,
}

/// 子命令
#[derive(Subcommand)]
pub enum Command {
    /// 合并旧版与新版导出，翻译俄文内容
    Merge(MergeArgs),
    /// 翻译单个表格中的全部俄文内容（含表头）
    Translate(TranslateArgs),
}

/// merge 子命令参数
#[derive(Args)]
pub struct MergeArgs {
    /// 旧版俄文导出（210列，1行表头）
    #[arg(long, value_name = "FILE")]
    pub legacy: PathBuf,

    /// 新版英文导出（219列，2行表头）
    #[arg(long, value_name = "FILE")]
    pub current: PathBuf,

    /// 输出文件路径
    #[arg(short, long, value_name = "FILE", default_value = cache_config::DEFAULT_MERGE_OUTPUT)]
    pub out: PathBuf,

    /// 翻译API调用间隔（秒）
    #[arg(long, default_value_t = service_config::DEFAULT_DELAY_SECS)]
    pub delay: f64,

    /// 翻译缓存JSON路径（加载/保存），默认位于输出文件同目录
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// 每新翻译N条保存一次缓存（0为不启用）
    #[arg(long, default_value_t = cache_config::DEFAULT_CHECKPOINT_EVERY)]
    pub checkpoint_every: usize,
}

/// translate 子命令参数
#[derive(Args)]
pub struct TranslateArgs {
    /// 输入表格
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// 输出文件路径 (可选，默认为输入文件名+_EN)
    #[arg(short, long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// 翻译API调用间隔（秒）
    #[arg(long, default_value_t = service_config::DEFAULT_DELAY_SECS)]
    pub delay: f64,

    /// 翻译缓存JSON路径（可选，不指定时仅在内存中缓存）
    #[arg(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// 每新翻译N条保存一次缓存（0为不启用）
    #[arg(long, default_value_t = cache_config::DEFAULT_CHECKPOINT_EVERY)]
    pub checkpoint_every: usize,
}

impl Cli {
    /// 按参数创建翻译服务
    pub fn build_provider(&self) -> Result<Box<dyn RemoteTranslator>> {
        match self.provider {
            Provider::Google => Ok(Box::new(GoogleTranslator::with_options(
                api_config::GOOGLE_WEB_API_URL,
                self.timeout,
            )?)),
            Provider::Deeplx => {
                let api_url = self.api.as_deref().unwrap_or(api_config::LOCAL_DEEPLX_URL);
                if !is_valid_api_url(api_url) {
                    return Err(reconcile_error!(config, "api", format!("无效的API地址: {}", api_url)));
                }
                Ok(Box::new(DeeplxTranslator::new(api_url, self.timeout)?))
            }
            Provider::Noop => Ok(Box::new(MockTranslator::new(MockMode::Echo))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_merge_defaults() {
        let cli = Cli::try_parse_from([
            "survey-reconcile",
            "merge",
            "--legacy",
            "a.csv",
            "--current",
            "b.csv",
            "--out",
            "out/merged.csv",
        ])
        .unwrap();
        let config = PipelineConfig::from_cli(&cli).unwrap();

        assert_eq!(config.delay(), Duration::from_millis(200));
        assert_eq!(
            config.cache_path(),
            Some(Path::new("out/translate_cache_merge.json"))
        );
        assert_eq!(config.checkpoint_every(), 50);
        assert_eq!(cli.provider, Provider::Google);
    }

    #[test]
    fn test_translate_without_cache_is_in_memory() {
        let cli = Cli::try_parse_from([
            "survey-reconcile",
            "translate",
            "--input",
            "a.csv",
            "--delay",
            "0",
            "--provider",
            "noop",
        ])
        .unwrap();
        let config = PipelineConfig::from_cli(&cli).unwrap();

        assert!(config.cache_path().is_none());
        assert!(config.delay().is_zero());
        assert_eq!(cli.build_provider().unwrap().provider_name(), "Mock Translator");
    }

    #[test]
    fn test_negative_delay_rejected() {
        let cli = Cli::try_parse_from([
            "survey-reconcile",
            "translate",
            "--input",
            "a.csv",
            "--delay=-1",
        ])
        .unwrap();
        assert!(PipelineConfig::from_cli(&cli).is_err());
    }

    #[test]
    fn test_overflowing_delay_rejected() {
        let cli = Cli::try_parse_from([
            "survey-reconcile",
            "translate",
            "--input",
            "a.csv",
            "--delay",
            "1e20",
        ])
        .unwrap();
        let err = PipelineConfig::from_cli(&cli).unwrap_err();
        assert!(matches!(err, crate::error::ReconcileError::Configuration { .. }));
    }

    #[test]
    fn test_invalid_deeplx_url_rejected() {
        let cli = Cli::try_parse_from([
            "survey-reconcile",
            "--provider",
            "deeplx",
            "--api",
            "localhost:1188",
            "translate",
            "--input",
            "a.csv",
        ])
        .unwrap();
        assert!(cli.build_provider().is_err());
    }
}
