//! 重试装饰器：对瞬时失败做有限次指数退避重试
//!
//! 进化循环本身不重试 Oracle 调用，重试策略只存在于客户端层。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::{LlmClient, LlmError, Message};

/// 退避上限
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 总尝试次数（含首次），至少 1
    pub max_attempts: u32,
    /// 首次重试前的等待，之后每次翻倍
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    /// 第 n 次失败（从 1 开始）之后的等待时间
    pub fn backoff(&self, failures: u32) -> Duration {
        let factor = 2u32.saturating_pow(failures.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// 包装任意 LlmClient，瞬时错误按 RetryConfig 重试，配置类错误直接返回
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    config: RetryConfig,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, config: RetryConfig) -> Self {
        Self { inner, config }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, LlmError> {
        let attempts = self.config.max_attempts.max(1);
        let mut failures = 0;
        loop {
            match self.inner.complete(messages).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && failures + 1 < attempts => {
                    failures += 1;
                    let delay = self.config.backoff(failures);
                    tracing::warn!(
                        "LLM call failed ({}), retry {}/{} in {:?}",
                        e,
                        failures,
                        attempts - 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn token_usage(&self) -> (u64, u64, u64) {
        self.inner.token_usage()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 前 fail_times 次返回 err，之后成功
    struct Flaky {
        calls: AtomicU32,
        fail_times: u32,
        err: LlmError,
    }

    #[async_trait]
    impl LlmClient for Flaky {
        async fn complete(&self, _messages: &[Message]) -> Result<String, LlmError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_times {
                Err(self.err.clone())
            } else {
                Ok("ok".to_string())
            }
        }
    }

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient() {
        let inner = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_times: 2,
            err: LlmError::Request("503".into()),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast());
        assert_eq!(client.complete_prompt("x").await.unwrap(), "ok");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let inner = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_times: 10,
            err: LlmError::Timeout(1),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast());
        assert_eq!(client.complete_prompt("x").await, Err(LlmError::Timeout(1)));
        assert_eq!(inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_config_error_not_retried() {
        let inner = Arc::new(Flaky {
            calls: AtomicU32::new(0),
            fail_times: 10,
            err: LlmError::Config("bad key".into()),
        });
        let client = RetryingLlmClient::new(inner.clone(), fast());
        assert!(client.complete_prompt("x").await.is_err());
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let cfg = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(cfg.backoff(1), Duration::from_millis(100));
        assert_eq!(cfg.backoff(3), Duration::from_millis(400));
        assert_eq!(cfg.backoff(40), MAX_BACKOFF);
    }
}
