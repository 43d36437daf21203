//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `HIVE__*` 覆盖（双下划线表示嵌套，如 `HIVE__LLM__PROVIDER=openai`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
    pub evolution: EvolutionSection,
    pub prompts: PromptsSection,
    pub output: OutputSection,
}

/// [app] 段
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：后端选择、system prompt、超时与重试
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 后端：openai / deepseek / mock；无 API Key 时回落到 mock
    pub provider: String,
    pub model: String,
    pub base_url: Option<String>,
    /// 每次请求前置的 system 消息
    pub system_prompt: Option<String>,
    pub deepseek: LlmDeepSeekSection,
    pub timeouts: LlmTimeoutsSection,
    pub retry: LlmRetrySection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4".to_string(),
            base_url: None,
            system_prompt: Some(
                "You are an inventive analyst. When asked for JSON, reply with JSON only."
                    .to_string(),
            ),
            deepseek: LlmDeepSeekSection::default(),
            timeouts: LlmTimeoutsSection::default(),
            retry: LlmRetrySection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmDeepSeekSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self { request: 60 }
    }
}

/// [llm.retry] 段：客户端层的重试（循环本身不重试）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmRetrySection {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for LlmRetrySection {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 500,
        }
    }
}

/// [evolution] 段：生成数量、组合上限、淘汰比例、并发与周期预算
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvolutionSection {
    /// 每周期新生成的想法数 N
    pub initial_idea_count: usize,
    /// 每周期最多组合的配对数 M
    pub max_combinations_per_cycle: usize,
    /// 保留 floor(len / selection_divisor) 个最佳想法
    pub selection_divisor: usize,
    /// 同一阶段内并发的 Oracle 调用数（1 = 顺序执行）
    pub oracle_concurrency: usize,
    /// 周期预算；未设置表示一直运行直到被取消
    pub max_cycles: Option<usize>,
}

impl Default for EvolutionSection {
    fn default() -> Self {
        Self {
            initial_idea_count: 4,
            max_combinations_per_cycle: 4,
            selection_divisor: 2,
            oracle_concurrency: 1,
            max_cycles: None,
        }
    }
}

/// [prompts] 段：覆盖内置 prompt 模板（占位符见 evolution::prompts）
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PromptsSection {
    pub generate: Option<String>,
    pub combine: Option<String>,
    pub evaluate: Option<String>,
}

/// [output] 段：每周期最佳想法的去向
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputSection {
    /// 是否打印到终端
    pub console: bool,
    /// 追加写入的 JSONL 文件
    pub jsonl_path: Option<PathBuf>,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            console: true,
            jsonl_path: None,
        }
    }
}

/// 从 config 目录加载配置，环境变量 HIVE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path，则追加该文件（可覆盖前面的键）；文件缺失或格式错误时返回错误
/// 3. 最后叠加环境变量 HIVE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        builder = builder.add_source(config::File::from(path.clone()).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("HIVE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.evolution.initial_idea_count, 4);
        assert_eq!(cfg.evolution.max_combinations_per_cycle, 4);
        assert_eq!(cfg.evolution.selection_divisor, 2);
        assert_eq!(cfg.evolution.oracle_concurrency, 1);
        assert!(cfg.evolution.max_cycles.is_none());
        assert!(cfg.output.console);
        assert_eq!(cfg.llm.timeouts.request, 60);
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "[evolution]\ninitial_idea_count = 6\nmax_cycles = 3\n\n[llm]\nprovider = \"mock\""
        )
        .unwrap();

        let cfg = load_config(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(cfg.evolution.initial_idea_count, 6);
        assert_eq!(cfg.evolution.max_cycles, Some(3));
        // 未写的键保留默认值
        assert_eq!(cfg.evolution.max_combinations_per_cycle, 4);
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.model, "gpt-4");
    }

    #[test]
    fn test_explicit_file_errors_are_reported() {
        let missing = std::env::temp_dir().join("idea-hive-no-such-config.toml");
        assert!(load_config(Some(missing)).is_err());

        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[evolution\ninitial_idea_count = ").unwrap();
        assert!(load_config(Some(file.path().to_path_buf())).is_err());
    }
}
