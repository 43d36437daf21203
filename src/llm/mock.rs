//! Mock LLM 客户端（用于测试与离线运行，无需 API）
//!
//! - `MockLlmClient`：识别生成 / 组合 / 评分三类 prompt，按对应 JSON 形状给出确定性回复
//! - `ScriptedLlmClient`：按顺序回放预置回复（或由闭包生成），并记录收到的 prompt

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::llm::{LlmClient, LlmError, Message, Role};

/// 取最后一条 User 消息
fn last_user(messages: &[Message]) -> &str {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .unwrap_or("")
}

/// 从右往左找第一个以 `open` 开头且能完整解析的 JSON 值
fn last_json_value(text: &str, open: char) -> Option<Value> {
    text.char_indices()
        .rev()
        .filter(|(_, c)| *c == open)
        .find_map(|(i, _)| {
            serde_json::Deserializer::from_str(&text[i..])
                .into_iter::<Value>()
                .next()
                .and_then(Result::ok)
        })
}

fn field<'a>(v: &'a Value, key: &str) -> &'a str {
    v.get(key).and_then(Value::as_str).unwrap_or("")
}

/// 由标题得到稳定的 0..=10 分
fn stable_score(title: &str, salt: u32) -> u32 {
    title
        .bytes()
        .fold(salt, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32))
        % 11
}

/// 离线 Mock：回复与真实 Oracle 同形状的 JSON
#[derive(Debug, Default)]
pub struct MockLlmClient {
    generation: AtomicUsize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn generate(&self, prompt: &str) -> String {
        let round = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let count = prompt
            .split(|c: char| !c.is_ascii_digit())
            .find_map(|s| s.parse::<usize>().ok())
            .unwrap_or(4);
        let ideas: Vec<Value> = (1..=count)
            .map(|i| {
                json!({
                    "title": format!("Concept {}.{}", round, i),
                    "description": format!("Mock idea number {} from generation round {}.", i, round),
                })
            })
            .collect();
        Value::Array(ideas).to_string()
    }

    fn combine(&self, prompt: &str) -> String {
        let pair = last_json_value(prompt, '[').unwrap_or(Value::Null);
        let (a, b) = match pair.as_array().map(Vec::as_slice) {
            Some([a, b, ..]) => (a.clone(), b.clone()),
            _ => (Value::Null, Value::Null),
        };
        json!({
            "title": format!("{} + {}", field(&a, "title"), field(&b, "title")),
            "description": format!("{} Combined with: {}", field(&a, "description"), field(&b, "description")),
        })
        .to_string()
    }

    fn evaluate(&self, prompt: &str) -> String {
        let idea = last_json_value(prompt, '{').unwrap_or(Value::Null);
        let title = field(&idea, "title");
        json!({
            "title": title,
            "description": field(&idea, "description"),
            "score": {
                "implementation": stable_score(title, 1),
                "usefulness": stable_score(title, 2),
                "innovation": stable_score(title, 3),
            }
        })
        .to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let prompt = last_user(messages);
        let reply = if prompt.contains("\"score\"") {
            self.evaluate(prompt)
        } else if prompt.to_lowercase().contains("combine") {
            self.combine(prompt)
        } else {
            self.generate(prompt)
        };
        Ok(reply)
    }
}

type Handler = Box<dyn Fn(&str) -> Result<String, LlmError> + Send + Sync>;

enum Script {
    Queue(Mutex<VecDeque<Result<String, LlmError>>>),
    Handler(Handler),
}

/// 测试替身：按调用顺序回放回复；队列耗尽时返回 Request 错误
pub struct ScriptedLlmClient {
    script: Script,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(responses.into_iter().map(|s| Ok(s.into())))
    }

    /// 允许在脚本中混入调用失败
    pub fn from_results(responses: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            script: Script::Queue(Mutex::new(responses.into_iter().collect())),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 由闭包根据 prompt 生成回复（适用于并发调用、顺序不确定的场景）
    pub fn from_fn<F>(handler: F) -> Self
    where
        F: Fn(&str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            script: Script::Handler(Box::new(handler)),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的 user prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let prompt = last_user(messages).to_string();
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.clone());
        }
        match &self.script {
            Script::Queue(queue) => queue
                .lock()
                .ok()
                .and_then(|mut q| q.pop_front())
                .unwrap_or_else(|| Err(LlmError::Request("script exhausted".to_string()))),
            Script::Handler(handler) => handler(&prompt),
        }
    }
}
