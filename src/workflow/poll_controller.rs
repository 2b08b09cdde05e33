//! 批处理任务轮询 - 流程层
//!
//! 状态流转：
//! 1. Idle → Polling：收到 Accepted，先取消旧会话再安装新会话
//! 2. Polling → Polling：任务未完成，刷新状态文字，等待下一次查询
//! 3. Polling → Resolved：completed 且带 results，替换结果集
//! 4. Polling → Failed：error 字段或 failed 状态，停止轮询
//!
//! 单次状态查询失败（网络错误、响应无法解析）不改变状态，下一次照常查询。

use crate::clients::{QaApi, BATCH_STATUS_ENDPOINT};
use crate::error::{AppError, AppResult};
use crate::models::{BatchStatusResponse, JobHandle, PollStep};
use crate::services::ResultSink;
use crate::workflow::poll_session::{PollSession, PollState};
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

#[derive(Debug, Default)]
struct SessionSlot {
    next_generation: u64,
    active: Option<PollSession>,
}

/// 轮询任务与控制器共享的状态
struct PollShared {
    api: Arc<dyn QaApi>,
    sink: ResultSink,
    slot: Mutex<SessionSlot>,
    state_tx: watch::Sender<PollState>,
}

impl PollShared {
    fn lock_slot(&self) -> MutexGuard<'_, SessionSlot> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// 应用一次查询结果，返回是否继续轮询
    ///
    /// 只有当前活动会话的响应才会生效
    fn apply(&self, generation: u64, step: PollStep) -> bool {
        let mut slot = self.lock_slot();

        let (job_id, expected_count, label) = match slot.active.as_ref() {
            Some(session) if session.generation == generation => (
                session.handle.job_id.clone(),
                session.expected_count,
                session.to_string(),
            ),
            _ => {
                debug!("丢弃过期的轮询响应 (会话#{})", generation);
                return false;
            }
        };

        match step {
            PollStep::InProgress(status) => {
                info!("⏳ {} 状态: {}", label, status);
                self.state_tx.send_replace(PollState::Polling {
                    job_id,
                    status_text: status.to_string(),
                    expected_count,
                });
                true
            }
            PollStep::Completed(results) => {
                if let Some(session) = slot.active.take() {
                    session.finish();
                }
                let result_count = results.len();
                self.sink.replace(results);
                info!("✅ {} 已完成，共 {} 条结果", label, result_count);
                self.state_tx.send_replace(PollState::Resolved {
                    job_id,
                    result_count,
                });
                false
            }
            PollStep::Failed(message) => {
                if let Some(session) = slot.active.take() {
                    session.finish();
                }
                error!("❌ {} 批处理失败: {}", label, message);
                self.state_tx
                    .send_replace(PollState::Failed { job_id, message });
                false
            }
        }
    }
}

/// 批处理任务轮询控制器
///
/// - 同一时刻最多一个轮询会话、一个定时任务
/// - 安装新会话前同步取消旧会话
/// - 过期会话的响应即使晚到也会被丢弃
pub struct PollController {
    shared: Arc<PollShared>,
    interval: Duration,
}

impl PollController {
    pub fn new(api: Arc<dyn QaApi>, sink: ResultSink, interval: Duration) -> Self {
        let (state_tx, _) = watch::channel(PollState::Idle);
        Self {
            shared: Arc::new(PollShared {
                api,
                sink,
                slot: Mutex::new(SessionSlot::default()),
                state_tx,
            }),
            interval,
        }
    }

    /// 为已接受的任务开始轮询，返回会话代数
    ///
    /// 第一次查询在一个间隔之后
    pub fn start(&self, handle: JobHandle, expected_count: Option<u64>) -> u64 {
        let mut slot = self.shared.lock_slot();

        if let Some(previous) = slot.active.take() {
            info!("⏹ 新任务取代旧的轮询 {}", previous);
            previous.cancel();
        }

        slot.next_generation += 1;
        let generation = slot.next_generation;

        let mut session = PollSession::new(generation, handle.clone(), expected_count);
        let token = session.token();

        self.shared.state_tx.send_replace(PollState::Polling {
            job_id: handle.job_id.clone(),
            status_text: "submitted".to_string(),
            expected_count,
        });

        info!(
            "🔄 开始轮询 {} (每 {} 秒查询一次)",
            session,
            self.interval.as_secs_f64()
        );

        let task = tokio::spawn(run_poll_loop(
            Arc::clone(&self.shared),
            generation,
            handle,
            self.interval,
            token,
        ));
        session.attach(task);
        slot.active = Some(session);

        generation
    }

    /// 取消当前会话，返回是否确实取消了
    pub fn cancel(&self) -> bool {
        let mut slot = self.shared.lock_slot();
        match slot.active.take() {
            Some(session) => {
                info!("⏹ 取消轮询 {}", session);
                session.cancel();
                self.shared.state_tx.send_replace(PollState::Idle);
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.shared.lock_slot().active.is_some()
    }

    /// 当前正在轮询的任务
    pub fn current_job(&self) -> Option<JobHandle> {
        self.shared
            .lock_slot()
            .active
            .as_ref()
            .map(|session| session.handle.clone())
    }

    pub fn state(&self) -> PollState {
        self.shared.state_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.shared.state_tx.subscribe()
    }

    /// 等待轮询结束（完成、失败或被取消）
    pub async fn wait_until_settled(&self) -> PollState {
        let mut rx = self.subscribe();
        let settled = match rx.wait_for(|state| !state.is_polling()).await {
            Ok(state) => state.clone(),
            Err(_) => self.state(),
        };
        settled
    }

    #[cfg(test)]
    fn apply(&self, generation: u64, step: PollStep) -> bool {
        self.shared.apply(generation, step)
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run_poll_loop(
    shared: Arc<PollShared>,
    generation: u64,
    handle: JobHandle,
    interval: Duration,
    token: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick: u64 = 0;

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tick += 1;

        let response = tokio::select! {
            _ = token.cancelled() => break,
            response = shared.api.batch_status(&handle.job_id) => response,
        };

        let step = match response.and_then(|value| parse_status(&handle, value)) {
            Ok(step) => step,
            Err(e) => {
                warn!("⚠️ {} 第 {} 次状态查询失败，继续轮询: {}", handle, tick, e);
                continue;
            }
        };

        if !shared.apply(generation, step) {
            break;
        }
    }

    debug!("{} 轮询结束 (会话#{}, 共查询 {} 次)", handle, generation, tick);
}

fn parse_status(handle: &JobHandle, value: JsonValue) -> AppResult<PollStep> {
    let response: BatchStatusResponse = serde_json::from_value(value).map_err(|e| {
        AppError::protocol(
            format!("{}/{}", BATCH_STATUS_ENDPOINT, handle.job_id),
            format!("JSON解析失败: {}", e),
        )
    })?;
    Ok(PollStep::from(response))
}
