//! 核心层：错误类型、关闭信号、组件编排

pub mod error;
pub mod orchestrator;
pub mod shutdown;

pub use error::EvolveError;
pub use orchestrator::{create_evolution_loop, create_llm_from_config, create_sink_from_config};
pub use shutdown::{latest_reason, ShutdownManager, ShutdownReason};
