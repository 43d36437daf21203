//! Evaluator：每个想法一次 Oracle 调用，按实现难度 / 有用性 / 创新性三个维度打分

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::EvolveError;
use crate::evolution::fanout::run_indexed;
use crate::evolution::parse::parse_evaluation;
use crate::evolution::prompts::PromptSet;
use crate::evolution::types::{Concept, ScoredIdea};
use crate::llm::{transcript, LlmClient};

/// 评分结果：顺序与输入一致（被丢弃的条目除外）
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    pub ideas: Vec<ScoredIdea>,
    pub dropped: usize,
}

pub struct IdeaEvaluator {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    system_prompt: Option<String>,
    concurrency: usize,
}

impl IdeaEvaluator {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptSet>,
        system_prompt: Option<String>,
        concurrency: usize,
    ) -> Self {
        Self {
            llm,
            prompts,
            system_prompt,
            concurrency,
        }
    }

    pub async fn evaluate(
        &self,
        ideas: &[Concept],
        cancel: &CancellationToken,
    ) -> Result<Evaluation, EvolveError> {
        let results = run_indexed(ideas.iter().collect::<Vec<_>>(), self.concurrency, cancel, |idea| async move {
            let messages = transcript(self.system_prompt.as_deref(), self.prompts.evaluate_prompt(idea));
            let raw = self.llm.complete(&messages).await?;
            tracing::debug!("Evaluator raw response for '{}': {}", idea.title(), raw);
            parse_evaluation(&raw, idea)
        })
        .await?;

        let mut evaluation = Evaluation::default();
        for (idx, result) in results {
            match result {
                Ok(scored) => {
                    tracing::info!(
                        "Scored '{}': implementation={} usefulness={} innovation={} (total {})",
                        scored.title(),
                        scored.scores().implementation(),
                        scored.scores().usefulness(),
                        scored.scores().innovation(),
                        scored.aggregate()
                    );
                    evaluation.ideas.push(scored);
                }
                Err(e) => {
                    tracing::warn!("Dropping evaluation of '{}': {}", ideas[idx].title(), e);
                    evaluation.dropped += 1;
                }
            }
        }
        Ok(evaluation)
    }
}
