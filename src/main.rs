//! cdx-fuzzy 命令行工具
//!
//! 校验模糊规则文件，并查看某个 key/url 会生成怎样的替代查询。

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use cdx_fuzzy::{CdxEntry, ConfigManager, FuzzyResultFilter, QueryParams, RuleLoader, RuleSet};

#[derive(Parser)]
#[command(name = "cdx-fuzzy")]
#[command(about = "CDX 模糊回退规则工具", version)]
struct Cli {
    /// 输出调试日志
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 加载并编译规则文件，逐条输出规则描述
    Check {
        /// 规则文件（JSON）
        rules: PathBuf,
    },

    /// 输出某个查询命中的规则与替代查询参数
    Explain {
        #[command(flatten)]
        lookup: LookupArgs,

        /// 额外查询参数（key=value，value 可为 JSON）
        #[arg(short, long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// 判断给定 MIME 的替代查询结果是否会被接受
    Filter {
        #[command(flatten)]
        lookup: LookupArgs,

        /// 候选结果的 MIME 类型
        #[arg(short, long)]
        mime: Option<String>,
    },
}

#[derive(clap::Args)]
struct LookupArgs {
    /// 规则文件（JSON）
    #[arg(short, long)]
    rules: PathBuf,

    /// 查询 key（SURT 形式）
    #[arg(short, long)]
    key: String,

    /// 原始 URL
    #[arg(short, long)]
    url: String,
}

impl LookupArgs {
    fn load(&self, verbose: bool) -> Result<RuleSet> {
        let config = ConfigManager::custom()
            .rules_path(self.rules.clone())
            .verbose(verbose)
            .build();
        RuleLoader::load(&config).with_context(|| format!("加载规则文件失败：{}", self.rules.display()))
    }

    fn query_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        params.insert("key".to_string(), Value::String(self.key.clone()));
        params.insert("url".to_string(), Value::String(self.url.clone()));
        params
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check { rules } => cmd_check(rules, cli.verbose),
        Commands::Explain { lookup, params } => cmd_explain(&lookup, &params, cli.verbose),
        Commands::Filter { lookup, mime } => cmd_filter(&lookup, mime, cli.verbose),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let filter = EnvFilter::from_default_env().add_directive(level.into());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_check(path: PathBuf, verbose: bool) -> Result<()> {
    let config = ConfigManager::custom().rules_path(path.clone()).verbose(verbose).build();
    let rules = RuleLoader::load(&config).with_context(|| format!("加载规则文件失败：{}", path.display()))?;

    println!("{}：{} 条有效规则", path.display(), rules.len());
    for (index, rule) in rules.rules().iter().enumerate() {
        println!("  #{:<3} {}", index, rule.describe());
    }
    Ok(())
}

fn cmd_explain(lookup: &LookupArgs, extra: &[String], verbose: bool) -> Result<()> {
    let rules = lookup.load(verbose)?;

    let mut params = lookup.query_params();
    for pair in extra {
        let (name, raw) = pair
            .split_once('=')
            .ok_or_else(|| anyhow!("参数格式应为 key=value：{}", pair))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        params.insert(name.to_string(), value);
    }

    match rules.find_and_build(&params)? {
        Some(result) => {
            println!("命中规则：{}", result.rule.describe());
            println!("{}", serde_json::to_string_pretty(&Value::Object(result.alt_params))?);
        }
        None => println!("无模糊规则命中"),
    }
    Ok(())
}

fn cmd_filter(lookup: &LookupArgs, mime: Option<String>, verbose: bool) -> Result<()> {
    let rules = lookup.load(verbose)?;
    let params = lookup.query_params();

    let Some(result) = rules.find_and_build(&params)? else {
        println!("无模糊规则命中");
        return Ok(());
    };

    let entry: CdxEntry = serde_json::from_value(match mime {
        Some(mime) => json!({ "mime": mime }),
        None => json!({}),
    })?;
    let allowed = FuzzyResultFilter::allow(result.rule, &lookup.url, &entry);
    println!("{}", if allowed { "接受" } else { "拒绝" });
    Ok(())
}
