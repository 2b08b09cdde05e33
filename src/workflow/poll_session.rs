//! 轮询会话
//!
//! 封装"正在轮询哪个任务"以及它的定时任务和取消令牌

use crate::models::JobHandle;
use std::fmt::Display;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// 轮询状态（对外可观察）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    /// 没有活动的轮询
    Idle,
    /// 正在轮询，status_text 仅用于显示
    Polling {
        job_id: String,
        status_text: String,
        expected_count: Option<u64>,
    },
    /// 任务完成，结果集已替换
    Resolved { job_id: String, result_count: usize },
    /// 任务失败，轮询已停止
    Failed { job_id: String, message: String },
}

impl PollState {
    pub fn is_polling(&self) -> bool {
        matches!(self, PollState::Polling { .. })
    }

    pub fn job_id(&self) -> Option<&str> {
        match self {
            PollState::Idle => None,
            PollState::Polling { job_id, .. }
            | PollState::Resolved { job_id, .. }
            | PollState::Failed { job_id, .. } => Some(job_id),
        }
    }
}

/// 轮询会话
///
/// 同一时刻最多存在一个。被丢弃时取消令牌，`cancel` 额外中止定时任务
#[derive(Debug)]
pub struct PollSession {
    /// 会话代数，用于丢弃过期响应
    pub generation: u64,
    pub handle: JobHandle,
    pub expected_count: Option<u64>,
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PollSession {
    pub fn new(generation: u64, handle: JobHandle, expected_count: Option<u64>) -> Self {
        Self {
            generation,
            handle,
            expected_count,
            token: CancellationToken::new(),
            task: None,
        }
    }

    /// 供定时任务监听的令牌
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn attach(&mut self, task: JoinHandle<()>) {
        self.task = Some(task);
    }

    /// 被新会话取代或显式取消：令牌取消并中止定时任务
    pub fn cancel(mut self) {
        self.token.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    /// 到达终态，由定时任务自己调用，不能中止自身
    pub fn finish(mut self) {
        self.token.cancel();
        self.task.take();
    }
}

impl Drop for PollSession {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl Display for PollSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[任务 {} 会话#{}]", self.handle.job_id, self.generation)
    }
}
