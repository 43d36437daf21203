//! Prompt 模板
//!
//! 占位符：`{count}`（生成数量）、`{ideas}`（待组合的两条想法，JSON 数组）、`{idea}`（待评分的想法，JSON 对象）。
//! 模板可在配置 [prompts] 段覆盖。

use crate::config::PromptsSection;
use crate::core::EvolveError;
use crate::evolution::types::Concept;

pub const DEFAULT_GENERATE: &str = r#"Generate {count} ideas that are new and useful.
Reply in JSON with this format, and output JSON only:
[
  {
    "title": ...,
    "description": ...
  }
]"#;

pub const DEFAULT_COMBINE: &str = r#"Given the following JSON, create a single item which takes both ideas and combines them into a single, coherent and useful idea. Output JSON in the same format as one object with "title" and "description". Output JSON only.

{ideas}"#;

pub const DEFAULT_EVALUATE: &str = r#"Given the following JSON idea, add a "score" (integers 0 to 10) evaluating how easy it is to implement, how useful it is to humanity, and how innovative it is. Reply with JSON only in this format:
{ "title": ..., "description": ..., "score": { "implementation": ..., "usefulness": ..., "innovation": ... } }

{idea}"#;

/// 三个阶段使用的模板
#[derive(Debug, Clone)]
pub struct PromptSet {
    pub generate: String,
    pub combine: String,
    pub evaluate: String,
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            generate: DEFAULT_GENERATE.to_string(),
            combine: DEFAULT_COMBINE.to_string(),
            evaluate: DEFAULT_EVALUATE.to_string(),
        }
    }
}

impl PromptSet {
    /// 以配置覆盖默认模板；覆盖的模板必须包含各自的占位符
    pub fn from_config(section: &PromptsSection) -> Result<Self, EvolveError> {
        let defaults = Self::default();
        let pick = |custom: &Option<String>, default: String, placeholder: &str| {
            match custom {
                Some(t) if !t.contains(placeholder) => Err(EvolveError::Config(format!(
                    "prompt template is missing the {} placeholder",
                    placeholder
                ))),
                Some(t) => Ok(t.clone()),
                None => Ok(default),
            }
        };
        Ok(Self {
            generate: pick(&section.generate, defaults.generate, "{count}")?,
            combine: pick(&section.combine, defaults.combine, "{ideas}")?,
            evaluate: pick(&section.evaluate, defaults.evaluate, "{idea}")?,
        })
    }

    pub fn generate_prompt(&self, count: usize) -> String {
        self.generate.replace("{count}", &count.to_string())
    }

    pub fn combine_prompt(&self, a: &Concept, b: &Concept) -> String {
        let pair = serde_json::to_string_pretty(&[a, b]).unwrap_or_default();
        self.combine.replace("{ideas}", &pair)
    }

    pub fn evaluate_prompt(&self, idea: &Concept) -> String {
        let json = serde_json::to_string_pretty(idea).unwrap_or_default();
        self.evaluate.replace("{idea}", &json)
    }
}
