//! Generator：一次 Oracle 调用产出 N 个未评分想法

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::EvolveError;
use crate::evolution::parse::parse_generation;
use crate::evolution::prompts::PromptSet;
use crate::evolution::types::Concept;
use crate::llm::{transcript, LlmClient};

/// 生成结果：保留的想法 + 因格式问题丢弃的条目数
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub ideas: Vec<Concept>,
    pub dropped: usize,
}

pub struct IdeaGenerator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    system_prompt: Option<String>,
}

impl IdeaGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptSet>, system_prompt: Option<String>) -> Self {
        Self {
            llm,
            prompts,
            system_prompt,
        }
    }

    /// 请求 count 个想法
    ///
    /// - 回复整体不是 JSON 数组：MalformedResponse
    /// - 单个元素缺字段、为空或标题重复：丢弃并计数
    /// - 多于 count 个时截断；少于 count 个时仅告警
    /// - Oracle 调用失败：OracleUnavailable，不在此层重试
    pub async fn generate(&self, count: usize) -> Result<Generation, EvolveError> {
        if count == 0 {
            return Err(EvolveError::Config("initial_idea_count must be at least 1".into()));
        }

        let messages = transcript(self.system_prompt.as_deref(), self.prompts.generate_prompt(count));
        let raw = self.llm.complete(&messages).await?;
        tracing::debug!("Generator raw response: {}", raw);

        let mut seen = HashSet::new();
        let mut generation = Generation::default();
        for item in parse_generation(&raw)? {
            match item {
                Ok(concept) if !seen.insert(concept.title().to_lowercase()) => {
                    tracing::warn!("Dropping duplicate generated idea '{}'", concept.title());
                    generation.dropped += 1;
                }
                Ok(concept) => generation.ideas.push(concept),
                Err(e) => {
                    tracing::warn!("Dropping generated idea: {}", e);
                    generation.dropped += 1;
                }
            }
        }

        if generation.ideas.len() > count {
            generation.ideas.truncate(count);
        } else if generation.ideas.len() < count {
            tracing::warn!(
                "Oracle returned {} usable idea(s), {} requested",
                generation.ideas.len(),
                count
            );
        }

        Ok(generation)
    }
}
