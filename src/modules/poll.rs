//! 取消标志与带超时的轮询等待。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// 跨线程共享的取消标志。
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 轮询结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// 条件满足。
    Ready,
    /// 超时前条件未满足。
    TimedOut,
    /// 被取消。
    Cancelled,
}

/// 每隔 `interval` 检查一次 `condition`，直到满足、超时或被取消。
///
/// 超时判定不早于 `timeout`；最后一次休眠会被截断到剩余时间，
/// 因此返回 `TimedOut` 的时刻不会晚于 `timeout + interval`。
pub fn wait_until<F>(
    interval: Duration,
    timeout: Duration,
    cancel: Option<&CancelToken>,
    mut condition: F,
) -> PollOutcome
where
    F: FnMut() -> bool,
{
    let start = Instant::now();
    loop {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return PollOutcome::Cancelled;
        }
        if condition() {
            return PollOutcome::Ready;
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return PollOutcome::TimedOut;
        }
        thread::sleep(interval.min(timeout - elapsed));
    }
}
