//! 想法（Idea）数据模型
//!
//! 想法要么未评分（Generator / Combiner 产出），要么三项分数齐全（Evaluator 产出），
//! 用两个变体表达，不存在“只评了一部分”的状态。

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::EvolveError;

/// 单项分数上限
pub const MAX_SCORE: u8 = 10;

/// 想法的内容：标题 + 描述；同时也是生成 / 组合阶段的 JSON 形状
///
/// 字段私有，只能经 [`Concept::new`] 构造；反序列化同样走校验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConcept")]
pub struct Concept {
    title: String,
    description: String,
}

#[derive(Deserialize)]
struct RawConcept {
    title: String,
    description: String,
}

impl TryFrom<RawConcept> for Concept {
    type Error = EvolveError;

    fn try_from(raw: RawConcept) -> Result<Self, Self::Error> {
        Concept::new(raw.title, raw.description)
    }
}

impl Concept {
    /// 校验并构造：标题与描述去除首尾空白后均不能为空
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Result<Self, EvolveError> {
        let title = title.into().trim().to_string();
        let description = description.into().trim().to_string();
        if title.is_empty() {
            return Err(EvolveError::MalformedResponse("idea has an empty title".into()));
        }
        if description.is_empty() {
            return Err(EvolveError::MalformedResponse(format!(
                "idea '{}' has an empty description",
                title
            )));
        }
        Ok(Self { title, description })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// 三个维度的分数，构造时保证每项在 [0, 10]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScores")]
pub struct Scores {
    implementation: u8,
    usefulness: u8,
    innovation: u8,
}

#[derive(Deserialize)]
struct RawScores {
    implementation: u8,
    usefulness: u8,
    innovation: u8,
}

impl TryFrom<RawScores> for Scores {
    type Error = EvolveError;

    fn try_from(raw: RawScores) -> Result<Self, Self::Error> {
        Scores::new(raw.implementation, raw.usefulness, raw.innovation)
    }
}

impl Scores {
    pub fn new(implementation: u8, usefulness: u8, innovation: u8) -> Result<Self, EvolveError> {
        for (axis, value) in [
            ("implementation", implementation),
            ("usefulness", usefulness),
            ("innovation", innovation),
        ] {
            if value > MAX_SCORE {
                return Err(EvolveError::MalformedResponse(format!(
                    "score '{}' = {} is outside 0..={}",
                    axis, value, MAX_SCORE
                )));
            }
        }
        Ok(Self {
            implementation,
            usefulness,
            innovation,
        })
    }

    pub fn implementation(&self) -> u8 {
        self.implementation
    }

    pub fn usefulness(&self) -> u8 {
        self.usefulness
    }

    pub fn innovation(&self) -> u8 {
        self.innovation
    }

    /// 排名键：三项简单求和，等权、不归一化
    pub fn aggregate(&self) -> u32 {
        self.implementation as u32 + self.usefulness as u32 + self.innovation as u32
    }
}

/// 已评分的想法；两部分各自已校验
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoredIdea {
    #[serde(flatten)]
    concept: Concept,
    #[serde(rename = "score")]
    scores: Scores,
}

impl ScoredIdea {
    pub fn new(concept: Concept, scores: Scores) -> Self {
        Self { concept, scores }
    }

    pub fn aggregate(&self) -> u32 {
        self.scores.aggregate()
    }

    pub fn title(&self) -> &str {
        self.concept.title()
    }

    pub fn concept(&self) -> &Concept {
        &self.concept
    }

    pub fn scores(&self) -> &Scores {
        &self.scores
    }
}

/// 池中的一个想法：未评分或已评分
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Idea {
    Unscored(Concept),
    Scored(ScoredIdea),
}

impl Idea {
    pub fn concept(&self) -> &Concept {
        match self {
            Idea::Unscored(c) => c,
            Idea::Scored(s) => &s.concept,
        }
    }

    pub fn scores(&self) -> Option<&Scores> {
        match self {
            Idea::Unscored(_) => None,
            Idea::Scored(s) => Some(&s.scores),
        }
    }

    pub fn is_scored(&self) -> bool {
        matches!(self, Idea::Scored(_))
    }

    /// 排名键；未评分时为 None
    pub fn aggregate(&self) -> Option<u32> {
        self.scores().map(Scores::aggregate)
    }
}

impl From<Concept> for Idea {
    fn from(c: Concept) -> Self {
        Idea::Unscored(c)
    }
}

impl From<ScoredIdea> for Idea {
    fn from(s: ScoredIdea) -> Self {
        Idea::Scored(s)
    }
}

/// 一个周期结束时保留下来的最佳想法，按排名有序，按值交给下一周期
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarryoverSet(Vec<ScoredIdea>);

impl CarryoverSet {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn from_ranked(ideas: Vec<ScoredIdea>) -> Self {
        Self(ideas)
    }

    pub fn ideas(&self) -> &[ScoredIdea] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn best(&self) -> Option<&ScoredIdea> {
        self.0.first()
    }

    pub fn into_inner(self) -> Vec<ScoredIdea> {
        self.0
    }
}

/// 各阶段因解析失败被丢弃的条目数
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DropCounts {
    pub generation: usize,
    pub combination: usize,
    pub evaluation: usize,
}

impl DropCounts {
    pub fn total(&self) -> usize {
        self.generation + self.combination + self.evaluation
    }
}

/// 单个周期的统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub cycle: usize,
    /// 本周期新生成的想法数
    pub generated: usize,
    /// 上一周期带入的想法数
    pub carried_in: usize,
    /// 实际选取的配对数
    pub pairs: usize,
    pub combined: usize,
    pub evaluated: usize,
    pub selected: usize,
    pub dropped: DropCounts,
}

/// 循环停止原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    BudgetExhausted,
    Cancelled,
}

/// 整次运行的结果
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub cycles: Vec<CycleReport>,
    pub final_carryover: CarryoverSet,
    pub stopped: StopReason,
}
