//! idea-hive - 想法进化循环
//!
//! 入口：加载 .env 与配置、初始化日志、选择 Oracle 后端，运行进化循环直到周期预算用完或收到 Ctrl+C。

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use idea_hive::config::{load_config, AppConfig};
use idea_hive::core::{
    create_evolution_loop, create_llm_from_config, create_sink_from_config, latest_reason,
    ShutdownManager,
};
use idea_hive::evolution::{CarryoverSet, StopReason};
use idea_hive::observability;

#[derive(Parser)]
#[command(name = "idea-hive")]
#[command(about = "Evolve ideas by generating, combining, scoring and selecting them with an LLM", long_about = None)]
struct Cli {
    /// Extra TOML config file (layered over config/default.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Stop after this many cycles (default: run until Ctrl+C)
    #[arg(short = 'n', long)]
    cycles: Option<usize>,

    /// Append each cycle's best ideas to this JSONL file
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// Use the offline mock oracle
    #[arg(long)]
    mock: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // API Key 等凭证可放在 .env
    let _ = dotenvy::dotenv();
    observability::init();

    // 显式指定的配置文件出错必须报错；只有默认搜索失败时才回落到内置默认值
    let mut cfg = match &cli.config {
        Some(path) => load_config(Some(path.clone()))
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => load_config(None).unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            AppConfig::default()
        }),
    };
    if let Some(n) = cli.cycles {
        cfg.evolution.max_cycles = Some(n);
    }
    if let Some(path) = cli.jsonl {
        cfg.output.jsonl_path = Some(path);
    }
    if cli.mock {
        cfg.llm.provider = "mock".to_string();
    }

    let llm = create_llm_from_config(&cfg);
    let sink = Arc::new(create_sink_from_config(&cfg));
    let evolution = create_evolution_loop(&cfg, llm.clone(), sink)
        .context("Invalid evolution configuration")?;

    let shutdown = Arc::new(ShutdownManager::new());
    let mut reasons = shutdown.subscribe();
    shutdown.install_signal_handlers();

    tracing::info!(
        "Run {} started (N={}, M={}, cycles={})",
        evolution.run_id(),
        cfg.evolution.initial_idea_count,
        cfg.evolution.max_combinations_per_cycle,
        cfg.evolution
            .max_cycles
            .map_or_else(|| "unbounded".to_string(), |n| n.to_string())
    );

    let summary = evolution
        .run(CarryoverSet::empty(), &shutdown.token())
        .await
        .context("Evolution run failed")?;

    let (prompt_tokens, completion_tokens, total_tokens) = llm.token_usage();
    tracing::info!(
        "Finished {} cycle(s), stop reason {:?}; tokens: prompt={} completion={} total={}",
        summary.cycles.len(),
        summary.stopped,
        prompt_tokens,
        completion_tokens,
        total_tokens
    );
    if summary.stopped == StopReason::Cancelled {
        match latest_reason(&mut reasons) {
            Some(reason) => tracing::info!("Run stopped early: {:?}", reason),
            None => tracing::info!("Run stopped early"),
        }
    }
    if let Some(best) = summary.final_carryover.best() {
        tracing::info!("Best idea: {} (score {})", best.title(), best.aggregate());
    }

    Ok(())
}
