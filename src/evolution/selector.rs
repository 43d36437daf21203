//! Selector：按排名键降序稳定排序，保留 floor(len / divisor) 个作为 CarryoverSet

use crate::core::EvolveError;
use crate::evolution::types::{CarryoverSet, ScoredIdea};

/// 默认淘汰一半
pub const DEFAULT_SELECTION_DIVISOR: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct Selector {
    divisor: usize,
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            divisor: DEFAULT_SELECTION_DIVISOR,
        }
    }
}

impl Selector {
    pub fn new(divisor: usize) -> Result<Self, EvolveError> {
        if divisor == 0 {
            return Err(EvolveError::Config("selection_divisor must be at least 1".into()));
        }
        Ok(Self { divisor })
    }

    /// 保留数量
    pub fn keep_count(&self, pool_len: usize) -> usize {
        pool_len / self.divisor
    }

    /// 分数相同时保持输入顺序（sort_by 为稳定排序）
    pub fn select(&self, mut pool: Vec<ScoredIdea>) -> CarryoverSet {
        let keep = self.keep_count(pool.len());
        pool.sort_by(|a, b| b.aggregate().cmp(&a.aggregate()));
        pool.truncate(keep);
        CarryoverSet::from_ranked(pool)
    }
}
