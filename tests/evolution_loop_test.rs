//! 进化循环集成测试：用脚本化 / Mock Oracle 驱动完整周期

use std::sync::Arc;

use async_trait::async_trait;
use idea_hive::core::EvolveError;
use idea_hive::evolution::{
    CarryoverSet, Concept, CycleRecord, EvolutionConfig, EvolutionLoop, MemorySink, OutputSink,
    PromptSet, ScoredIdea, Scores, Selector, StopReason,
};
use idea_hive::llm::{LlmClient, LlmError, MockLlmClient, ScriptedLlmClient};
use tokio_util::sync::CancellationToken;

const GENERATED: &str = r#"```json
[
  {"title": "Smart Traffic Lights", "description": "Sensors and AI optimise traffic flow."},
  {"title": "Virtual Wardrobe", "description": "Plan outfits from photos of your clothes."},
  {"title": "Solar Kites", "description": "Airborne wind and solar harvesting."},
  {"title": "Library of Things", "description": "Borrow tools instead of buying them."}
]
```"#;

fn merged(title: &str) -> String {
    format!(r#"{{"title": "{}", "description": "A hybrid of two ideas."}}"#, title)
}

fn scored(title: &str, s: (u8, u8, u8)) -> String {
    format!(
        r#"{{"title": "{}", "description": "A hybrid of two ideas.", "score": {{"implementation": {}, "usefulness": {}, "innovation": {}}}}}"#,
        title, s.0, s.1, s.2
    )
}

fn config(max_cycles: Option<usize>) -> EvolutionConfig {
    EvolutionConfig {
        max_cycles,
        ..Default::default()
    }
}

fn evolution(llm: Arc<dyn LlmClient>, cfg: EvolutionConfig, sink: Arc<dyn OutputSink>) -> EvolutionLoop {
    EvolutionLoop::new(llm, cfg, PromptSet::default(), None, sink).unwrap()
}

/// 一个完整周期：4 个想法 → 6 个可能配对取前 4 个 → 评分 → 保留前 2 名
fn one_cycle_script() -> Vec<String> {
    vec![
        GENERATED.to_string(),
        merged("H1"),
        merged("H2"),
        merged("H3"),
        merged("H4"),
        scored("H1", (2, 3, 4)),
        scored("H2", (9, 9, 9)),
        scored("H3", (5, 5, 5)),
        scored("H4", (1, 1, 1)),
    ]
}

#[tokio::test]
async fn test_single_cycle_selects_best_half() {
    let llm = Arc::new(ScriptedLlmClient::new(one_cycle_script()));
    let sink = MemorySink::new();
    let evo = evolution(llm.clone(), config(Some(1)), Arc::new(sink.clone()));

    let summary = evo.run(CarryoverSet::empty(), &CancellationToken::new()).await.unwrap();

    assert_eq!(summary.stopped, StopReason::BudgetExhausted);
    assert_eq!(summary.cycles.len(), 1);
    let best: Vec<_> = summary
        .final_carryover
        .ideas()
        .iter()
        .map(|s| (s.title().to_string(), s.aggregate()))
        .collect();
    assert_eq!(best, vec![("H2".to_string(), 27), ("H3".to_string(), 15)]);

    let report = &summary.cycles[0];
    assert_eq!(report.generated, 4);
    assert_eq!(report.pairs, 4);
    assert_eq!(report.combined, 4);
    assert_eq!(report.evaluated, 4);
    assert_eq!(report.selected, 2);
    assert_eq!(report.dropped.total(), 0);

    // 1 次生成 + 4 次组合 + 4 次评分
    assert_eq!(llm.call_count(), 9);

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].best, summary.final_carryover);
    assert_eq!(records[0].run_id, evo.run_id());
}

#[tokio::test]
async fn test_carryover_threads_into_next_cycle() {
    let sink = MemorySink::new();
    let evo = evolution(Arc::new(MockLlmClient::new()), config(Some(3)), Arc::new(sink.clone()));

    let summary = evo.run(CarryoverSet::empty(), &CancellationToken::new()).await.unwrap();

    assert_eq!(summary.cycles.len(), 3);
    assert_eq!(summary.cycles[0].carried_in, 0);
    for pair in summary.cycles.windows(2) {
        assert_eq!(pair[1].carried_in, pair[0].selected);
    }
    // 周期 2 起池子 = 4 个新想法 + 2 个带入想法，配对仍被截断到 M = 4
    assert_eq!(summary.cycles[1].pairs, 4);
    assert_eq!(sink.records().len(), 3);
    assert_eq!(summary.final_carryover, sink.records()[2].best);
}

#[tokio::test]
async fn test_oracle_unavailable_terminates_run() {
    let llm = Arc::new(ScriptedLlmClient::from_results([
        Ok(GENERATED.to_string()),
        Err(LlmError::Request("401 Unauthorized".into())),
    ]));
    let sink = MemorySink::new();
    let evo = evolution(llm, config(Some(5)), Arc::new(sink.clone()));

    let err = evo.run(CarryoverSet::empty(), &CancellationToken::new()).await.unwrap_err();

    assert!(matches!(err, EvolveError::OracleUnavailable(_)));
    assert!(sink.records().is_empty());
}

#[tokio::test]
async fn test_malformed_items_are_dropped_and_counted() {
    let llm = Arc::new(ScriptedLlmClient::new([
        GENERATED.to_string(),
        merged("H1"),
        "Sorry, I can't merge those.".to_string(),
        merged("H3"),
        merged("H4"),
        scored("H1", (2, 3, 4)),
        scored("H3", (5, 5, 11)),
        scored("H4", (1, 1, 1)),
    ]));
    let evo = evolution(llm, config(Some(1)), Arc::new(MemorySink::new()));

    let summary = evo.run(CarryoverSet::empty(), &CancellationToken::new()).await.unwrap();

    let report = &summary.cycles[0];
    assert_eq!(report.pairs, 4);
    assert_eq!(report.combined, 3);
    assert_eq!(report.evaluated, 2);
    assert_eq!(report.dropped.combination, 1);
    assert_eq!(report.dropped.evaluation, 1);
    assert_eq!(report.selected, 1);
    assert_eq!(summary.final_carryover.best().unwrap().title(), "H1");
}

#[tokio::test]
async fn test_unusable_generation_falls_back_to_carryover() {
    let carry = Selector::default().select(vec![
        ScoredIdea::new(Concept::new("Veteran A", "a").unwrap(), Scores::new(8, 8, 8).unwrap()),
        ScoredIdea::new(Concept::new("Veteran B", "b").unwrap(), Scores::new(7, 7, 7).unwrap()),
        ScoredIdea::new(Concept::new("Loser C", "c").unwrap(), Scores::new(0, 0, 0).unwrap()),
        ScoredIdea::new(Concept::new("Loser D", "d").unwrap(), Scores::new(0, 0, 1).unwrap()),
    ]);
    assert_eq!(carry.len(), 2);

    let llm = Arc::new(ScriptedLlmClient::new([
        "not json".to_string(),
        merged("AB"),
        scored("AB", (6, 6, 6)),
    ]));
    let evo = evolution(llm.clone(), config(Some(1)), Arc::new(MemorySink::new()));

    let (next, report) = evo.run_cycle(1, carry, &CancellationToken::new()).await.unwrap();

    assert_eq!(report.generated, 0);
    assert_eq!(report.dropped.generation, 4);
    assert_eq!(report.carried_in, 2);
    assert_eq!(report.pairs, 1);
    assert_eq!(report.evaluated, 1);
    // floor(1 / 2) = 0
    assert!(next.is_empty());
    let combine_prompt = &llm.prompts()[1];
    assert!(combine_prompt.contains("Veteran A") && combine_prompt.contains("Veteran B"));
}

/// 第一次输出后触发取消的输出端
struct CancelAfterFirst {
    token: CancellationToken,
    inner: MemorySink,
}

#[async_trait]
impl OutputSink for CancelAfterFirst {
    async fn emit(&self, record: &CycleRecord) -> Result<(), EvolveError> {
        self.inner.emit(record).await?;
        self.token.cancel();
        Ok(())
    }

    fn name(&self) -> &'static str {
        "cancel-after-first"
    }
}

#[tokio::test]
async fn test_unbounded_run_stops_on_cancellation() {
    let token = CancellationToken::new();
    let inner = MemorySink::new();
    let sink = Arc::new(CancelAfterFirst {
        token: token.clone(),
        inner: inner.clone(),
    });
    let evo = evolution(Arc::new(MockLlmClient::new()), config(None), sink);

    let summary = evo.run(CarryoverSet::empty(), &token).await.unwrap();

    assert_eq!(summary.stopped, StopReason::Cancelled);
    assert_eq!(summary.cycles.len(), 1);
    assert_eq!(inner.records().len(), 1);
    assert_eq!(summary.final_carryover, inner.records()[0].best);
}

#[tokio::test]
async fn test_cancelled_before_start_runs_nothing() {
    let token = CancellationToken::new();
    token.cancel();
    let llm = Arc::new(ScriptedLlmClient::new(one_cycle_script()));
    let evo = evolution(llm.clone(), config(Some(3)), Arc::new(MemorySink::new()));

    let summary = evo.run(CarryoverSet::empty(), &token).await.unwrap();

    assert_eq!(summary.stopped, StopReason::Cancelled);
    assert!(summary.cycles.is_empty());
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_concurrent_oracle_calls_match_sequential_result() {
    let cfg = EvolutionConfig {
        oracle_concurrency: 4,
        ..config(Some(2))
    };
    let concurrent = evolution(Arc::new(MockLlmClient::new()), cfg, Arc::new(MemorySink::new()))
        .run(CarryoverSet::empty(), &CancellationToken::new())
        .await
        .unwrap();
    let sequential = evolution(Arc::new(MockLlmClient::new()), config(Some(2)), Arc::new(MemorySink::new()))
        .run(CarryoverSet::empty(), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(concurrent.final_carryover, sequential.final_carryover);
    assert_eq!(concurrent.cycles, sequential.cycles);
}
