use clap::{Parser, Subcommand};
use perdcomp_import::db::{MemoryRepository, PgRepository, Repository};
use perdcomp_import::service::{available_balance, batch_balance, export_to_csv};
use perdcomp_import::{create_pool, AppConfig, Importer};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

/// 将 PER/DCOMP PDF 表单导入 perdcomp 数据表
#[derive(Debug, Parser)]
#[command(name = "perdcomp-import", version, about)]
struct Cli {
    /// 配置文件（默认读取当前目录的 perdcomp.toml）
    #[arg(long, global = true, env = "PERDCOMP_CONFIG")]
    config: Option<PathBuf>,

    /// 使用内存存储试运行，不写数据库
    #[arg(long, global = true)]
    dry_run: bool,

    /// 输出 DEBUG 级别日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 分类导入目录中的所有 PDF
    Import {
        #[arg(long)]
        directory: PathBuf,
        /// 同时将提取的字段导出为 CSV
        #[arg(long)]
        export_csv: Option<PathBuf>,
    },
    /// 从三个目录分别导入 PER、DCOMP 和债务
    ImportSplit {
        #[arg(long)]
        per_dir: PathBuf,
        #[arg(long)]
        dcomp_dir: PathBuf,
        #[arg(long)]
        debitos_dir: PathBuf,
    },
    /// 导入目录中 DCOMP 文件的债务行
    Debitos {
        #[arg(long)]
        directory: PathBuf,
    },
    /// 可用余额
    Saldo {
        /// 只统计该 CNPJ 的公司（可带标点）
        #[arg(long)]
        cnpj: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run<R: Repository>(
    importer: Importer<R>,
    command: Command,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Import {
            directory,
            export_csv,
        } => {
            let (report, batch) = importer.import_directory(&directory).await?;
            if let Some(path) = export_csv {
                export_to_csv(&batch, &path)?;
            }
            info!("batch balance: {:?}", batch_balance(&batch));
            print_json(&report)?;
        }
        Command::ImportSplit {
            per_dir,
            dcomp_dir,
            debitos_dir,
        } => {
            let (report, debits) = importer
                .import_split(&per_dir, &dcomp_dir, &debitos_dir)
                .await?;
            print_json(&report)?;
            print_json(&debits)?;
        }
        Command::Debitos { directory } => {
            let report = importer.import_debits(&directory).await?;
            print_json(&report)?;
        }
        Command::Saldo { cnpj } => {
            let balance = available_balance(importer.repository(), cnpj.as_deref()).await?;
            print_json(&balance)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // 初始化日志 - 使用本地时间格式
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .with_max_level(level)
        .init();

    // 加载配置
    let config = AppConfig::load(cli.config.as_deref())?;

    if cli.dry_run {
        info!("dry run: using the in-memory store");
        let importer = Importer::with_config(MemoryRepository::new(), config.import);
        return run(importer, cli.command).await;
    }

    // 创建数据库连接池
    let pool = create_pool(&config.database).await?;
    info!("Database pool created");
    let importer = Importer::with_config(PgRepository::new(pool), config.import);
    run(importer, cli.command).await
}
