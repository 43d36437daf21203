//! Combiner：从池中按字典序取前 M 个无序配对，每对经 Oracle 合并成一个新想法

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::core::EvolveError;
use crate::evolution::fanout::run_indexed;
use crate::evolution::parse::parse_combination;
use crate::evolution::prompts::PromptSet;
use crate::evolution::types::{Concept, Idea};
use crate::llm::{transcript, LlmClient};

/// choose(n, 2)
pub fn pair_count(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

/// 按池下标字典序枚举 (i, j)，i < j，取前 max 个
pub fn select_pairs(pool_len: usize, max: usize) -> Vec<(usize, usize)> {
    (0..pool_len)
        .flat_map(|i| (i + 1..pool_len).map(move |j| (i, j)))
        .take(max)
        .collect()
}

/// 组合结果
#[derive(Debug, Clone, Default)]
pub struct Combination {
    pub ideas: Vec<Concept>,
    /// 实际选取的配对数
    pub pairs: usize,
    pub dropped: usize,
}

pub struct IdeaCombiner {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptSet>,
    system_prompt: Option<String>,
    max_combinations: usize,
    concurrency: usize,
}

impl IdeaCombiner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptSet>,
        system_prompt: Option<String>,
        max_combinations: usize,
        concurrency: usize,
    ) -> Self {
        Self {
            llm,
            prompts,
            system_prompt,
            max_combinations,
            concurrency,
        }
    }

    pub fn max_combinations(&self) -> usize {
        self.max_combinations
    }

    /// 合并池中的配对；输出数量 = 成功处理的配对数（≤ M）
    pub async fn combine(
        &self,
        pool: &[Idea],
        cancel: &CancellationToken,
    ) -> Result<Combination, EvolveError> {
        let possible = pair_count(pool.len());
        if pool.len() < 2 {
            tracing::info!("{}; nothing to combine", EvolveError::InsufficientPool { available: pool.len() });
        } else if possible < self.max_combinations {
            tracing::info!(
                "Requested {} combinations but only {} pairs exist; using all of them",
                self.max_combinations,
                possible
            );
        }

        let pairs = select_pairs(pool.len(), self.max_combinations);
        let selected = pairs.len();
        let inputs: Vec<(&Concept, &Concept)> = pairs
            .into_iter()
            .map(|(i, j)| (pool[i].concept(), pool[j].concept()))
            .collect();

        let results = run_indexed(inputs, self.concurrency, cancel, |(a, b)| async move {
            let messages = transcript(self.system_prompt.as_deref(), self.prompts.combine_prompt(a, b));
            let raw = self.llm.complete(&messages).await?;
            tracing::debug!("Combiner raw response for '{}' x '{}': {}", a.title(), b.title(), raw);
            parse_combination(&raw)
        })
        .await?;

        let mut combination = Combination {
            pairs: selected,
            ..Default::default()
        };
        for (idx, result) in results {
            match result {
                Ok(concept) => {
                    tracing::info!("Combined: {}", concept.title());
                    combination.ideas.push(concept);
                }
                Err(e) => {
                    tracing::warn!("Dropping combination #{}: {}", idx, e);
                    combination.dropped += 1;
                }
            }
        }
        Ok(combination)
    }
}
