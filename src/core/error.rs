//! 进化循环错误类型
//!
//! - OracleUnavailable：调用级失败，本层不重试，终止当前周期并上抛
//! - MalformedResponse：解析/形状错误，由各阶段按条目丢弃并计数，不中断周期
//! - InsufficientPool：可组合的想法不足，仅作信息提示（降级为使用全部可能的配对）

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum EvolveError {
    #[error("Oracle unavailable: {0}")]
    OracleUnavailable(#[from] LlmError),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Insufficient pool: {available} idea(s) available to combine")]
    InsufficientPool { available: usize },

    #[error("Cancelled")]
    Cancelled,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Output sink failed: {0}")]
    Sink(String),
}

impl EvolveError {
    /// 是否应终止整个运行（Malformed / InsufficientPool 只影响单个条目）
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            EvolveError::MalformedResponse(_) | EvolveError::InsufficientPool { .. }
        )
    }
}
