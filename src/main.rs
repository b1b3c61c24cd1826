// ==========================================
// 商品批量导入引擎 - 命令行入口
// ==========================================
// 子命令: products:import / stock:import / products:attributes / db:init
// 错误边界: 库内为 thiserror 枚举，这里统一转 anyhow
// ==========================================

use anyhow::{Context, Result};
use catalog_import::api::{ImportApi, ImportApiResponse};
use catalog_import::config::ImportOverrides;
use catalog_import::domain::BackendType;
use catalog_import::domain::count_keys;
use catalog_import::logging::{self, LogFormat};
use catalog_import::LinkageScheme;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

const DB_PATH_ENV: &str = "CATALOG_IMPORT_DB_PATH";

#[derive(Debug, Parser)]
#[command(name = "catalog-import")]
#[command(about = "商品批量导入引擎", version)]
struct Cli {
    /// SQLite 数据库路径
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db: Option<String>,

    /// 以 JSON 格式输出日志
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// 导入商品 CSV
    #[command(name = "products:import")]
    ProductsImport {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        store: Option<u16>,
        #[arg(long)]
        batch_size: Option<i64>,
        #[arg(long)]
        attribute_set: Option<u16>,
        /// 使用生成语句批量 upsert
        #[arg(long)]
        raw_sql: bool,
    },

    /// 导入库存 JSON
    #[command(name = "stock:import")]
    StockImport {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        batch_size: Option<i64>,
    },

    /// 查看单个商品的属性
    #[command(name = "products:attributes")]
    ProductsAttributes {
        #[arg(long)]
        sku: String,
        #[arg(long, default_value_t = 0)]
        store: u16,
    },

    /// 建库并写入默认属性
    #[command(name = "db:init")]
    DbInit {
        /// 使用 row_id 关联方案（版本化目录）
        #[arg(long)]
        row_id: bool,
    },
}

/// 默认数据库路径: 用户数据目录下的 catalog-import/catalog.db
fn default_db_path() -> String {
    let mut path = PathBuf::from("./catalog.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("catalog-import");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("catalog.db");
        }
    }
    path.to_string_lossy().to_string()
}

fn print_import_report(report: &ImportApiResponse) {
    for w in &report.warnings {
        println!("WARN  {}", w);
    }

    let count = |key: &str| report.counts.get(key).copied().unwrap_or(0);

    println!("run_id:        {}", report.run_id);
    println!("rows:          {}", report.total_rows);
    println!("created:       {}", report.created);
    println!("updated:       {}", report.updated);
    println!("skipped:       {}", report.skipped);
    let eav: Vec<String> = BackendType::EAV
        .iter()
        .map(|bt| format!("{}={}", bt, count(bt.as_str())))
        .collect();
    println!("eav:           {}", eav.join(" "));
    println!("stock:         {}", count(count_keys::STOCK));
    println!("gallery:       {}", count(count_keys::GALLERY));
    println!("price_index:   {}", count(count_keys::PRICE_INDEX));
    println!("linkage:       {}", report.linkage);
    println!("mode:          {}", report.write_strategy);
    println!(
        "time:          process={}ms db={}ms total={}ms",
        report.process_ms, report.db_ms, report.total_ms
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    });

    let db_path = cli
        .db
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .unwrap_or_else(default_db_path);
    tracing::info!(db_path = %db_path, version = catalog_import::VERSION, "使用数据库");

    let api = ImportApi::new(db_path);

    match cli.command {
        Commands::ProductsImport {
            file,
            store,
            batch_size,
            attribute_set,
            raw_sql,
        } => {
            let overrides = ImportOverrides {
                store_id: store,
                batch_size,
                attribute_set,
                raw_sql_mode: raw_sql.then_some(true),
            };
            let file = file.to_string_lossy().to_string();
            let report = api
                .import_products(&file, overrides)
                .await
                .with_context(|| format!("导入失败: {}", file))?;
            print_import_report(&report);
        }
        Commands::StockImport { file, batch_size } => {
            let body = std::fs::read_to_string(&file)
                .with_context(|| format!("读取文件失败: {}", file.display()))?;
            let body = match batch_size {
                Some(n) => override_batch_size(&body, n)?,
                None => body,
            };
            let result = api.import_stock_json(&body).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::ProductsAttributes { sku, store } => {
            let attrs = api.get_product_attributes(&sku, store).await?;
            println!("{}", serde_json::to_string_pretty(&attrs)?);
        }
        Commands::DbInit { row_id } => {
            let scheme = if row_id {
                LinkageScheme::RowId
            } else {
                LinkageScheme::EntityId
            };
            let result = api.init_database(scheme)?;
            println!(
                "initialized: linkage={} attributes={}",
                result.linkage, result.attributes_seeded
            );
        }
    }

    Ok(())
}

/// 命令行的 --batch-size 覆盖请求体中的 batch_size
fn override_batch_size(body: &str, batch_size: i64) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(body).context("库存 JSON 解析失败")?;
    let wrapped = match value {
        serde_json::Value::Array(items) => serde_json::json!({ "items": items, "batch_size": batch_size }),
        serde_json::Value::Object(mut obj) => {
            obj.insert("batch_size".to_string(), serde_json::json!(batch_size));
            serde_json::Value::Object(obj)
        }
        _ => anyhow::bail!("库存 JSON 必须是对象或数组"),
    };
    Ok(wrapped.to_string())
}
