//! 有界重试辅助.
//!
//! 硬件编解码器的输入/输出缓冲区队列是异步就绪的: 取缓冲区的调用可能暂时
//! 没有可用项. 本模块把"固定间隔轮询 + 固定次数上限 + 超时硬失败"的契约
//! 抽象为一个可复用的辅助函数, 供音频/视频会话在输入输出两侧共用.
//!
//! 组帧逻辑本身永远不重试; 重试只属于硬件队列边界.

use std::time::Duration;

use crate::{XunError, XunResult};

/// 默认轮询次数上限
pub const DEFAULT_MAX_ATTEMPTS: u32 = 8;

/// 默认轮询间隔
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(5);

/// 轮询参数 (次数上限 + 每次间隔)
#[derive(Debug, Clone, Copy)]
pub struct PollBudget {
    /// 轮询次数上限
    pub max_attempts: u32,
    /// 每次尝试之间的休眠间隔
    pub backoff: Duration,
}

impl Default for PollBudget {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff: DEFAULT_BACKOFF,
        }
    }
}

/// 有界轮询
///
/// 反复调用 `f` 直到它返回 `Some`, 每次失败后休眠 `budget.backoff`.
/// 预算耗尽后返回 `XunError::Timeout`, 携带 `what` 描述等待的对象.
///
/// `f` 返回 `Err` 时立即向上传播, 不计入重试.
pub fn poll_bounded<T, F>(budget: PollBudget, what: &str, mut f: F) -> XunResult<T>
where
    F: FnMut() -> XunResult<Option<T>>,
{
    for attempt in 0..budget.max_attempts {
        if let Some(value) = f()? {
            return Ok(value);
        }
        if attempt + 1 < budget.max_attempts {
            std::thread::sleep(budget.backoff);
        }
    }
    Err(XunError::Timeout(format!(
        "{} (尝试 {} 次)",
        what, budget.max_attempts
    )))
}
