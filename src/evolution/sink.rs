//! 输出端：每完成一个周期调用一次，接收该周期的最佳想法
//!
//! - ConsoleSink：彩色打印到终端
//! - JsonlSink：每周期追加一行 JSON（异步文件 I/O）
//! - MemorySink：收集到内存（测试用）
//! - FanoutSink：同时写多个输出端

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use crossterm::style::Stylize;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::core::EvolveError;
use crate::evolution::types::{CarryoverSet, CycleReport};

/// 一个周期的输出记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleRecord {
    pub run_id: String,
    pub cycle: usize,
    pub finished_at: DateTime<Utc>,
    pub report: CycleReport,
    pub best: CarryoverSet,
}

#[async_trait]
pub trait OutputSink: Send + Sync {
    async fn emit(&self, record: &CycleRecord) -> Result<(), EvolveError>;

    /// 输出端名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 终端输出
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait]
impl OutputSink for ConsoleSink {
    async fn emit(&self, record: &CycleRecord) -> Result<(), EvolveError> {
        let r = &record.report;
        println!(
            "\n{}",
            format!("=== Cycle {} · best ideas ===", record.cycle).green().bold()
        );
        println!(
            "{}",
            format!(
                "generated {} · carried in {} · combined {}/{} · scored {} · kept {} · dropped {}",
                r.generated,
                r.carried_in,
                r.combined,
                r.pairs,
                r.evaluated,
                r.selected,
                r.dropped.total()
            )
            .dark_grey()
        );
        if record.best.is_empty() {
            println!("{}", "(no ideas survived this cycle)".yellow());
        }
        for (rank, idea) in record.best.ideas().iter().enumerate() {
            println!(
                "{} {} {}",
                format!("#{}", rank + 1).yellow(),
                idea.title().bold(),
                format!(
                    "[{} = impl {} + use {} + innov {}]",
                    idea.aggregate(),
                    idea.scores().implementation(),
                    idea.scores().usefulness(),
                    idea.scores().innovation()
                )
                .cyan()
            );
            println!("   {}", idea.concept().description());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

/// 追加写入 JSON Lines 文件
#[derive(Debug, Clone)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl OutputSink for JsonlSink {
    async fn emit(&self, record: &CycleRecord) -> Result<(), EvolveError> {
        let mut line = serde_json::to_string(record).map_err(|e| EvolveError::Sink(e.to_string()))?;
        line.push('\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| EvolveError::Sink(format!("{}: {}", parent.display(), e)))?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| EvolveError::Sink(format!("{}: {}", self.path.display(), e)))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| EvolveError::Sink(e.to_string()))?;
        file.flush().await.map_err(|e| EvolveError::Sink(e.to_string()))
    }

    fn name(&self) -> &'static str {
        "jsonl"
    }
}

/// 内存收集
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<CycleRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CycleRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn emit(&self, record: &CycleRecord) -> Result<(), EvolveError> {
        self.records
            .lock()
            .map_err(|e| EvolveError::Sink(e.to_string()))?
            .push(record.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// 依次写入多个输出端；任一失败即返回错误
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn OutputSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

#[async_trait]
impl OutputSink for FanoutSink {
    async fn emit(&self, record: &CycleRecord) -> Result<(), EvolveError> {
        for sink in &self.sinks {
            sink.emit(record).await.map_err(|e| {
                tracing::warn!("Output sink '{}' failed: {}", sink.name(), e);
                e
            })?;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fanout"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::selector::Selector;
    use crate::evolution::types::{Concept, ScoredIdea, Scores};

    fn record(cycle: usize) -> CycleRecord {
        let best = Selector::default().select(vec![
            ScoredIdea::new(Concept::new("A", "a").unwrap(), Scores::new(1, 2, 3).unwrap()),
            ScoredIdea::new(Concept::new("B", "b").unwrap(), Scores::new(4, 5, 6).unwrap()),
        ]);
        CycleRecord {
            run_id: "run-1".to_string(),
            cycle,
            finished_at: Utc::now(),
            report: CycleReport {
                cycle,
                selected: best.len(),
                ..Default::default()
            },
            best,
        }
    }

    #[tokio::test]
    async fn test_jsonl_sink_appends_one_line_per_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("ideas.jsonl");
        let sink = JsonlSink::new(&path);
        sink.emit(&record(1)).await.unwrap();
        sink.emit(&record(2)).await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: CycleRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed.cycle, 2);
        assert_eq!(parsed.best.ideas()[0].title(), "B");
        assert_eq!(parsed.best.ideas()[0].aggregate(), 15);
    }

    #[tokio::test]
    async fn test_fanout_reaches_every_sink() {
        let a = MemorySink::new();
        let b = MemorySink::new();
        let fanout = FanoutSink::new()
            .with(Arc::new(a.clone()))
            .with(Arc::new(b.clone()));
        assert_eq!(fanout.len(), 2);
        fanout.emit(&record(1)).await.unwrap();
        assert_eq!(a.records().len(), 1);
        assert_eq!(b.records()[0].cycle, 1);
    }

    #[tokio::test]
    async fn test_console_sink_prints() {
        ConsoleSink.emit(&record(3)).await.unwrap();
    }
}
