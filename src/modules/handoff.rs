//! 单槽位的最新帧交接。
//!
//! 采集端用新帧覆盖未被取走的旧帧，发送端总是拿到最新的一帧；
//! 旧帧被丢弃而不是排队。

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Slot<T> {
    frame: Option<T>,
    closed: bool,
    dropped: u64,
}

/// 最新帧槽位。
#[derive(Debug)]
pub struct LatestFrame<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> LatestFrame<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                frame: None,
                closed: false,
                dropped: 0,
            }),
            ready: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        // 锁中毒时继续使用槽位
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 放入新帧，返回是否覆盖了未取走的旧帧。关闭后放入的帧被忽略。
    pub fn publish(&self, frame: T) -> bool {
        let mut slot = self.lock();
        if slot.closed {
            return false;
        }
        let replaced = slot.frame.replace(frame).is_some();
        if replaced {
            slot.dropped += 1;
        }
        drop(slot);
        self.ready.notify_one();
        replaced
    }

    /// 等待并取走最新帧。超时或槽位已关闭且为空时返回 `None`。
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        loop {
            if let Some(frame) = slot.frame.take() {
                return Some(frame);
            }
            if slot.closed {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            slot = self
                .ready
                .wait_timeout(slot, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    /// 关闭槽位并唤醒等待者。
    pub fn close(&self) {
        self.lock().closed = true;
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// 被覆盖丢弃的帧数。
    pub fn dropped(&self) -> u64 {
        self.lock().dropped
    }
}

impl<T> Default for LatestFrame<T> {
    fn default() -> Self {
        Self::new()
    }
}
