//! Oracle 层：客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock），以及重试装饰器

pub mod deepseek;
pub mod message;
pub mod mock;
pub mod openai;
pub mod retry;
pub mod traits;

pub use deepseek::{
    create_deepseek_client, resolve_deepseek_model, DEEPSEEK_BASE_URL, DEEPSEEK_CHAT, DEEPSEEK_REASONER,
};
pub use message::{transcript, Message, Role};
pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use openai::{OpenAiClient, TokenUsage};
pub use retry::{RetryConfig, RetryingLlmClient};
pub use traits::{LlmClient, LlmError};
