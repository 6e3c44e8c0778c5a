use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use survey_reconcile::config::{Cli, Command, PipelineConfig};
use survey_reconcile::pipeline::{run_merge, run_translate};
use survey_reconcile::stats::{format_duration, print_stats_report};
use survey_reconcile::utils::{generate_output_path, init_logging};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    let total_start = Instant::now();

    if let Err(e) = run(&cli).await {
        eprintln!("❌ 运行失败: {:#}", e);
        std::process::exit(1);
    }

    if !cli.quiet {
        info!("✅ 完成！总耗时: {}", format_duration(total_start.elapsed()));
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let config = PipelineConfig::from_cli(cli).context("配置无效")?;
    let backend = cli.build_provider().context("创建翻译服务失败")?;
    let total_start = Instant::now();

    let stats = match &cli.command {
        Command::Merge(args) => {
            info!("🚀 合并旧版与新版导出，翻译俄文内容");
            let (merged, stats) =
                run_merge(&config, &args.legacy, &args.current, &args.out, backend).await?;
            let summary = stats
                .rows_per_source
                .iter()
                .map(|(source, rows)| format!("{} ({})", rows, source))
                .collect::<Vec<_>>()
                .join(" + ");
            info!("📊 核心数据集: {} = {} 名参与者", summary, merged.rows.len());
            stats
        }
        Command::Translate(args) => {
            let output = generate_output_path(&args.input, args.out.as_deref(), &cli.target_lang);
            let stats = run_translate(&config, &args.input, &output, backend).await?;
            info!("📄 输出文件: {}", output.display());
            stats
        }
    };

    if stats.adapter.failures > 0 {
        info!(
            "ℹ️  {} 条文本翻译失败，已保留原文",
            stats.adapter.failures
        );
    }

    if cli.stats || cli.verbose {
        print_stats_report(&stats, total_start.elapsed());
    }

    Ok(())
}
