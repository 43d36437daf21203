//! DeepSeek 预设：复用 OpenAI 兼容客户端，只换 base URL、模型与密钥来源

use crate::config::LlmSection;
use crate::llm::OpenAiClient;

pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com";
pub const DEEPSEEK_CHAT: &str = "deepseek-chat";
pub const DEEPSEEK_REASONER: &str = "deepseek-reasoner";

/// 解析 DeepSeek 模型名
///
/// 顺序：`[llm.deepseek] model` → `DEEPSEEK_MODEL` → `[llm] model`（仅当它是 deepseek-*）→ `deepseek-chat`。
/// `[llm] model` 默认是 OpenAI 模型名，不能直接发给 DeepSeek。
pub fn resolve_deepseek_model(section: &LlmSection, env_model: Option<String>) -> String {
    section
        .deepseek
        .model
        .clone()
        .or(env_model)
        .or_else(|| {
            section
                .model
                .starts_with("deepseek")
                .then(|| section.model.clone())
        })
        .unwrap_or_else(|| DEEPSEEK_CHAT.to_string())
}

/// 按 [llm] 段创建 DeepSeek 客户端；密钥优先 `DEEPSEEK_API_KEY`，其次 `OPENAI_API_KEY`
pub fn create_deepseek_client(section: &LlmSection) -> OpenAiClient {
    let api_key = std::env::var("DEEPSEEK_API_KEY")
        .or_else(|_| std::env::var("OPENAI_API_KEY"))
        .ok();
    let model = resolve_deepseek_model(section, std::env::var("DEEPSEEK_MODEL").ok());
    let base_url = section.base_url.as_deref().unwrap_or(DEEPSEEK_BASE_URL);

    OpenAiClient::new(Some(base_url), &model, api_key.as_deref())
        .with_timeout_secs(section.timeouts.request)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openai_model_name_not_forwarded() {
        let section = LlmSection::default();
        assert_eq!(resolve_deepseek_model(&section, None), DEEPSEEK_CHAT);
    }

    #[test]
    fn test_model_resolution_order() {
        let mut section = LlmSection::default();
        section.model = DEEPSEEK_REASONER.to_string();
        assert_eq!(resolve_deepseek_model(&section, None), DEEPSEEK_REASONER);
        assert_eq!(
            resolve_deepseek_model(&section, Some("deepseek-v9".into())),
            "deepseek-v9"
        );

        section.deepseek.model = Some("pinned".into());
        assert_eq!(
            resolve_deepseek_model(&section, Some("deepseek-v9".into())),
            "pinned"
        );
    }
}
