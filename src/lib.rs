//! idea-hive - 基于 LLM 的想法进化循环
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型、关闭信号、组件编排
//! - **evolution**: 生成 → 组合 → 评分 → 筛选 的周期循环与数据模型
//! - **llm**: Oracle 客户端抽象与实现（OpenAI 兼容 / DeepSeek / Mock）
//! - **observability**: 日志初始化

pub mod config;
pub mod core;
pub mod evolution;
pub mod llm;
pub mod observability;

pub use evolution::{CarryoverSet, EvolutionConfig, EvolutionLoop, Idea, ScoredIdea};
