//! 阶段内的 Oracle 调用扇出
//!
//! 同一阶段内各调用互相独立，可按 concurrency 并发；结果按输入下标归位，与完成先后无关。
//! 每次调用前检查取消 token；遇到致命错误（Oracle 不可用、取消）立即返回，
//! 未完成的调用随 stream 一起被丢弃。

use std::future::Future;

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::core::EvolveError;

/// 逐条结果：下标 + 该条的成功值或可恢复错误
pub type Indexed<T> = (usize, Result<T, EvolveError>);

pub async fn run_indexed<I, T, F, Fut>(
    inputs: Vec<I>,
    concurrency: usize,
    cancel: &CancellationToken,
    call: F,
) -> Result<Vec<Indexed<T>>, EvolveError>
where
    F: Fn(I) -> Fut,
    Fut: Future<Output = Result<T, EvolveError>>,
{
    let total = inputs.len();
    let mut results = stream::iter(inputs.into_iter().enumerate())
        .map(|(idx, input)| {
            let fut = (!cancel.is_cancelled()).then(|| call(input));
            async move {
                match fut {
                    Some(fut) => (idx, fut.await),
                    None => (idx, Err(EvolveError::Cancelled)),
                }
            }
        })
        .buffered(concurrency.max(1));

    let mut out = Vec::with_capacity(total);
    while let Some((idx, result)) = results.next().await {
        match result {
            Err(e) if e.is_fatal() => return Err(e),
            other => out.push((idx, other)),
        }
    }
    Ok(out)
}
