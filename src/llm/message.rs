//! 对话消息：发给 Oracle 的有序 transcript 由若干带角色的 Message 组成

use serde::{Deserialize, Serialize};

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 组装单轮 transcript：可选 system prompt + 一条 user prompt
pub fn transcript(system_prompt: Option<&str>, prompt: impl Into<String>) -> Vec<Message> {
    let mut messages = Vec::with_capacity(2);
    if let Some(sys) = system_prompt.filter(|s| !s.trim().is_empty()) {
        messages.push(Message::system(sys));
    }
    messages.push(Message::user(prompt));
    messages
}
