//! # Timers 模块
//!
//! 基于 tokio 的定时器后端。
//!
//! 每个定时器是一个可中止的任务，到期后把 [`TimerFired`] 发回舞台的
//! 事件循环。取消只中止任务；已经进入通道的事件由控制器按
//! `TimerId` 过滤，不会影响之后的周期。

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::trace;

use curtain_runtime::TimerId;

use crate::adapter::TimerBackend;

/// 到期事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerFired {
    /// 幕布标识
    pub curtain: String,
    /// 到期的定时器
    pub timer: TimerId,
}

/// tokio 定时器后端（每块幕布一个）
pub struct TokioTimers {
    curtain: String,
    tx: UnboundedSender<TimerFired>,
    tasks: HashMap<TimerId, AbortHandle>,
}

impl TokioTimers {
    /// 创建后端
    pub fn new(curtain: impl Into<String>, tx: UnboundedSender<TimerFired>) -> Self {
        Self {
            curtain: curtain.into(),
            tx,
            tasks: HashMap::new(),
        }
    }

    /// 仍在运行的定时器数量
    pub fn active(&self) -> usize {
        self.tasks.values().filter(|h| !h.is_finished()).count()
    }

    /// 清理已结束的任务
    fn prune(&mut self) {
        self.tasks.retain(|_, handle| !handle.is_finished());
    }

    fn fired(&self, timer: TimerId) -> TimerFired {
        TimerFired {
            curtain: self.curtain.clone(),
            timer,
        }
    }
}

impl TimerBackend for TokioTimers {
    fn schedule_once(&mut self, timer: TimerId, delay: Duration) {
        self.prune();
        let tx = self.tx.clone();
        let event = self.fired(timer);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(curtain = %event.curtain, timer = %event.timer, "定时器到期");
            // 舞台已关闭时丢弃
            let _ = tx.send(event);
        });
        self.tasks.insert(timer, handle.abort_handle());
    }

    fn schedule_repeating(&mut self, timer: TimerId, interval: Duration) {
        self.prune();
        let tx = self.tx.clone();
        let event = self.fired(timer);
        let period = interval.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(event.clone()).is_err() {
                    break;
                }
            }
        });
        self.tasks.insert(timer, handle.abort_handle());
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(handle) = self.tasks.remove(&timer) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for handle in self.tasks.values() {
            handle.abort();
        }
    }
}
