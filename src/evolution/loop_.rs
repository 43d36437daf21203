use std::sync::Arc;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::core::EvolveError;
use crate::evolution::combiner::IdeaCombiner;
use crate::evolution::engine::{EvolutionConfig, EvolutionEngine};
use crate::evolution::evaluator::IdeaEvaluator;
use crate::evolution::generator::{Generation, IdeaGenerator};
use crate::evolution::prompts::PromptSet;
use crate::evolution::selector::Selector;
use crate::evolution::sink::{CycleRecord, OutputSink};
use crate::evolution::types::{CarryoverSet, CycleReport, DropCounts, Idea, RunSummary, StopReason};
use crate::llm::LlmClient;

/// 周期控制器：生成 → 组合 → 评分 → 筛选，筛选结果按值带入下一周期
///
/// 跨周期只传递 CarryoverSet，循环本身不持有可变状态。
pub struct EvolutionLoop {
    generator: IdeaGenerator,
    combiner: IdeaCombiner,
    evaluator: IdeaEvaluator,
    selector: Selector,
    sink: Arc<dyn OutputSink>,
    config: EvolutionConfig,
    run_id: String,
}

impl EvolutionLoop {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        config: EvolutionConfig,
        prompts: PromptSet,
        system_prompt: Option<String>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self, EvolveError> {
        config.validate()?;
        let prompts = Arc::new(prompts);

        Ok(Self {
            generator: IdeaGenerator::new(llm.clone(), prompts.clone(), system_prompt.clone()),
            combiner: IdeaCombiner::new(
                llm.clone(),
                prompts.clone(),
                system_prompt.clone(),
                config.max_combinations_per_cycle,
                config.oracle_concurrency,
            ),
            evaluator: IdeaEvaluator::new(llm, prompts, system_prompt, config.oracle_concurrency),
            selector: Selector::new(config.selection_divisor)?,
            sink,
            config,
            run_id: uuid::Uuid::new_v4().to_string(),
        })
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn config(&self) -> &EvolutionConfig {
        &self.config
    }

    /// 运行直到周期预算用完或 token 被取消
    ///
    /// Oracle 不可用等致命错误会终止运行并上抛；取消时返回最后一个完整周期的结果。
    pub async fn run(
        &self,
        initial: CarryoverSet,
        cancel: &CancellationToken,
    ) -> Result<RunSummary, EvolveError> {
        let mut engine = EvolutionEngine::new(self.config.max_cycles);
        let mut carryover = initial;
        let mut cycles = Vec::new();

        let stopped = loop {
            if !engine.can_continue() {
                break StopReason::BudgetExhausted;
            }
            if cancel.is_cancelled() {
                break StopReason::Cancelled;
            }

            let cycle = engine.current_cycle() + 1;
            match self.run_cycle(cycle, carryover.clone(), cancel).await {
                Ok((next, report)) => {
                    carryover = next;
                    cycles.push(report);
                }
                Err(EvolveError::Cancelled) => {
                    tracing::info!("Cycle {} cancelled; keeping results of cycle {}", cycle, cycle - 1);
                    break StopReason::Cancelled;
                }
                Err(e) => {
                    tracing::error!("Cycle {} failed: {}", cycle, e);
                    return Err(e);
                }
            }
            engine.increment_cycle();
        };

        tracing::info!(
            "Evolution stopped after {} cycle(s) ({:?}), {} idea(s) carried",
            cycles.len(),
            stopped,
            carryover.len()
        );

        Ok(RunSummary {
            cycles,
            final_carryover: carryover,
            stopped,
        })
    }

    /// 执行一个周期，返回新的 CarryoverSet 与统计；完成后调用一次输出端
    pub async fn run_cycle(
        &self,
        cycle: usize,
        carryover: CarryoverSet,
        cancel: &CancellationToken,
    ) -> Result<(CarryoverSet, CycleReport), EvolveError> {
        tracing::info!("Starting cycle {} ({} idea(s) carried in)", cycle, carryover.len());
        let mut report = CycleReport {
            cycle,
            carried_in: carryover.len(),
            ..Default::default()
        };
        let mut dropped = DropCounts::default();

        // Step 1: 生成
        if cancel.is_cancelled() {
            return Err(EvolveError::Cancelled);
        }
        let generation = match self.generator.generate(self.config.initial_idea_count).await {
            Ok(g) => g,
            Err(EvolveError::MalformedResponse(msg)) => {
                tracing::warn!("Generation response unusable ({}); combining carryover only", msg);
                Generation {
                    ideas: Vec::new(),
                    dropped: self.config.initial_idea_count,
                }
            }
            Err(e) => return Err(e),
        };
        report.generated = generation.ideas.len();
        dropped.generation = generation.dropped;

        // Step 2: 组合（新想法在前，带入的想法在后）
        let pool: Vec<Idea> = generation
            .ideas
            .into_iter()
            .map(Idea::from)
            .chain(carryover.into_inner().into_iter().map(Idea::from))
            .collect();
        let combination = self.combiner.combine(&pool, cancel).await?;
        report.pairs = combination.pairs;
        report.combined = combination.ideas.len();
        dropped.combination = combination.dropped;

        // Step 3: 评分
        let evaluation = self.evaluator.evaluate(&combination.ideas, cancel).await?;
        report.evaluated = evaluation.ideas.len();
        dropped.evaluation = evaluation.dropped;

        // Step 4: 筛选
        let best = self.selector.select(evaluation.ideas);
        report.selected = best.len();
        report.dropped = dropped;

        tracing::info!(
            "Cycle {} done: generated={} carried_in={} pairs={} combined={} evaluated={} selected={} dropped={}",
            cycle,
            report.generated,
            report.carried_in,
            report.pairs,
            report.combined,
            report.evaluated,
            report.selected,
            report.dropped.total()
        );

        let record = CycleRecord {
            run_id: self.run_id.clone(),
            cycle,
            finished_at: Utc::now(),
            report: report.clone(),
            best,
        };
        self.sink.emit(&record).await?;

        Ok((record.best, report))
    }
}
