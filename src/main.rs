// ==========================================
// 忠诚度数据 ETL - 命令行入口
// ==========================================
// run: 进程内顺序执行四个阶段
// extract / validate / transform / load: 单阶段执行，
//   阶段间通过 --context 指定的 JSON 文件交接运行上下文
// ==========================================

use anyhow::Context;
use clap::{Parser, Subcommand};
use loyalty_etl::config::PipelineConfig;
use loyalty_etl::logging;
use loyalty_etl::pipeline::{load_context, save_context, PipelineRunner};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

const DEFAULT_CONTEXT_FILE: &str = "run_context.json";

#[derive(Parser)]
#[command(name = "loyalty-etl")]
#[command(about = "Loyalty points / purchases spreadsheet ETL")]
#[command(version)]
struct Cli {
    /// TOML 配置文件（可选，环境变量优先级更高）
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 顺序执行 extract → validate → transform → load
    Run,
    /// 解析输入目录中的工作簿，分类并落地原始批次
    Extract {
        #[arg(long, default_value = DEFAULT_CONTEXT_FILE)]
        context: PathBuf,
    },
    /// 对原始批次做结构校验
    Validate {
        #[arg(long, default_value = DEFAULT_CONTEXT_FILE)]
        context: PathBuf,
    },
    /// 数据质量清洗并上传产物
    Transform {
        #[arg(long, default_value = DEFAULT_CONTEXT_FILE)]
        context: PathBuf,
    },
    /// 装载清洗后文件并重建汇总表
    Load {
        #[arg(long, default_value = DEFAULT_CONTEXT_FILE)]
        context: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = PipelineConfig::load(cli.config.as_deref()).context("加载配置失败")?;
    logging::init(config.log_format);

    info!("==================================================");
    info!("{} v{}", loyalty_etl::APP_NAME, loyalty_etl::VERSION);
    info!(
        input_dir = %config.input_dir.display(),
        work_dir = %config.work_dir.display(),
        warehouse = %config.warehouse_db_path.display(),
        "配置已加载"
    );
    info!("==================================================");

    let runner = PipelineRunner::from_config(config).context("初始化流水线失败")?;

    match cli.command {
        Commands::Run => {
            let report = runner.run().await?;
            print_json(&report)?;
        }
        Commands::Extract { context } => {
            let mut ctx = runner.start_run();
            let batches = runner.extract(&mut ctx).await?;
            save_context(&ctx, &context)?;
            info!(run_id = %ctx.run_id, batches, context = %context.display(), "运行上下文已保存");
            print_json(&ctx)?;
        }
        Commands::Validate { context } => {
            let mut ctx = read_context(&context)?;
            let summary = runner.validate(&mut ctx).await?;
            save_context(&ctx, &context)?;
            print_json(&summary)?;
        }
        Commands::Transform { context } => {
            let mut ctx = read_context(&context)?;
            let summary = runner.transform(&mut ctx).await?;
            save_context(&ctx, &context)?;
            print_json(&summary)?;
        }
        Commands::Load { context } => {
            let ctx = read_context(&context)?;
            let summary = runner.load(&ctx).await?;
            print_json(&summary)?;
        }
    }

    Ok(())
}

fn read_context(path: &Path) -> anyhow::Result<loyalty_etl::RunContext> {
    load_context(path).with_context(|| format!("请先执行 extract 生成 {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
