//! 进化循环：生成 → 组合 → 评分 → 筛选，最佳想法带入下一周期

pub mod combiner;
pub mod engine;
pub mod evaluator;
pub mod fanout;
pub mod generator;
pub mod loop_;
pub mod parse;
pub mod prompts;
pub mod selector;
pub mod sink;
pub mod types;

pub use combiner::{pair_count, select_pairs, Combination, IdeaCombiner};
pub use engine::{EvolutionConfig, EvolutionEngine};
pub use evaluator::{Evaluation, IdeaEvaluator};
pub use generator::{Generation, IdeaGenerator};
pub use loop_::EvolutionLoop;
pub use prompts::PromptSet;
pub use selector::Selector;
pub use sink::{ConsoleSink, CycleRecord, FanoutSink, JsonlSink, MemorySink, OutputSink};
pub use types::{
    CarryoverSet, Concept, CycleReport, DropCounts, Idea, RunSummary, ScoredIdea, Scores,
    StopReason,
};
