//! 编排：根据配置组装 Oracle 客户端、输出端与进化循环

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::core::EvolveError;
use crate::evolution::{ConsoleSink, EvolutionConfig, EvolutionLoop, FanoutSink, JsonlSink, OutputSink, PromptSet};
use crate::llm::{
    create_deepseek_client, LlmClient, MockLlmClient, OpenAiClient, RetryConfig, RetryingLlmClient,
};

/// 根据配置与环境变量选择 LLM 后端（DeepSeek / OpenAI 兼容 / Mock），并套上重试
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let provider = cfg.llm.provider.to_lowercase();
    let has_deepseek_key = std::env::var("DEEPSEEK_API_KEY").is_ok();
    let has_openai_key = std::env::var("OPENAI_API_KEY").is_ok();

    let base: Arc<dyn LlmClient> = match provider.as_str() {
        "mock" => {
            tracing::info!("Using Mock LLM");
            return Arc::new(MockLlmClient::new());
        }
        "deepseek" if has_deepseek_key || has_openai_key => {
            let client = create_deepseek_client(&cfg.llm);
            tracing::info!("Using DeepSeek LLM ({})", client.model());
            Arc::new(client)
        }
        "openai" if has_openai_key => {
            tracing::info!("Using OpenAI LLM ({})", cfg.llm.model);
            Arc::new(
                OpenAiClient::new(
                    cfg.llm.base_url.as_deref(),
                    &cfg.llm.model,
                    std::env::var("OPENAI_API_KEY").ok().as_deref(),
                )
                .with_timeout_secs(cfg.llm.timeouts.request),
            )
        }
        _ => {
            tracing::warn!(
                "No API key set or provider '{}' unknown, using Mock LLM",
                cfg.llm.provider
            );
            return Arc::new(MockLlmClient::new());
        }
    };

    Arc::new(RetryingLlmClient::new(
        base,
        RetryConfig {
            max_attempts: cfg.llm.retry.max_attempts,
            base_delay: Duration::from_millis(cfg.llm.retry.base_delay_ms),
        },
    ))
}

/// 根据 [output] 段组装输出端
pub fn create_sink_from_config(cfg: &AppConfig) -> FanoutSink {
    let mut sink = FanoutSink::new();
    if cfg.output.console {
        sink = sink.with(Arc::new(ConsoleSink));
    }
    if let Some(path) = &cfg.output.jsonl_path {
        tracing::info!("Appending best ideas to {}", path.display());
        sink = sink.with(Arc::new(JsonlSink::new(path)));
    }
    if sink.is_empty() {
        tracing::warn!("No output sink configured; cycle results are only logged");
    }
    sink
}

/// 组装进化循环
pub fn create_evolution_loop(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    sink: Arc<dyn OutputSink>,
) -> Result<EvolutionLoop, EvolveError> {
    let prompts = PromptSet::from_config(&cfg.prompts)?;
    EvolutionLoop::new(
        llm,
        EvolutionConfig::from(cfg.evolution.clone()),
        prompts,
        cfg.llm.system_prompt.clone(),
        sink,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_provider_selected_explicitly() {
        let mut cfg = AppConfig::default();
        cfg.llm.provider = "mock".into();
        let llm = create_llm_from_config(&cfg);
        assert_eq!(llm.token_usage(), (0, 0, 0));
    }

    #[test]
    fn test_sink_from_config() {
        let mut cfg = AppConfig::default();
        cfg.output.console = true;
        cfg.output.jsonl_path = None;
        assert_eq!(create_sink_from_config(&cfg).len(), 1);

        cfg.output.console = false;
        cfg.output.jsonl_path = Some("out/best.jsonl".into());
        assert_eq!(create_sink_from_config(&cfg).len(), 1);

        cfg.output.console = true;
        assert_eq!(create_sink_from_config(&cfg).len(), 2);

        // 空的 fanout 也是合法输出端
        cfg.output.console = false;
        cfg.output.jsonl_path = None;
        assert!(create_sink_from_config(&cfg).is_empty());
    }

    #[test]
    fn test_invalid_evolution_config_rejected() {
        let mut cfg = AppConfig::default();
        cfg.evolution.selection_divisor = 0;
        let err = create_evolution_loop(&cfg, Arc::new(MockLlmClient::new()), Arc::new(FanoutSink::new()));
        assert!(matches!(err, Err(EvolveError::Config(_))));
    }
}
