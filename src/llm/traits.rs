//! Oracle 客户端抽象
//!
//! 所有后端（OpenAI 兼容 / DeepSeek / Mock）实现 LlmClient：输入有序 transcript，输出一段文本。
//! 核心循环只依赖这个 trait，不关心网络、鉴权与限流。

use async_trait::async_trait;
use thiserror::Error;

use crate::llm::Message;

/// 调用级错误：网络、鉴权、限流、超时等
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0}s")]
    Timeout(u64),

    #[error("empty completion")]
    EmptyResponse,

    #[error("client misconfigured: {0}")]
    Config(String),
}

impl LlmError {
    /// 是否值得重试（配置错误重试无意义）
    pub fn is_transient(&self) -> bool {
        !matches!(self, LlmError::Config(_))
    }
}

/// LLM 客户端 trait：text_complete(transcript) -> text
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 非流式完成
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError>;

    /// 单条 prompt 的便捷调用
    async fn complete_prompt(&self, prompt: &str) -> Result<String, LlmError> {
        self.complete(&[Message::user(prompt)]).await
    }

    /// 获取累计 token 使用统计：(prompt_tokens, completion_tokens, total_tokens)
    /// 默认返回 (0, 0, 0)，具体实现可覆盖
    fn token_usage(&self) -> (u64, u64, u64) {
        (0, 0, 0)
    }
}
