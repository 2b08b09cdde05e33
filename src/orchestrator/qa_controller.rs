//! 提交控制器 - 编排层
//!
//! ## 职责
//!
//! 持有一次会话里的全部可变状态（题目批次、结果集、轮询会话），
//! 把 Builder → Dispatcher → PollController / ResultSink → ExportGateway 串起来。
//!
//! ## 核心规则
//!
//! 1. **先取消再提交**：每次提交前同步取消当前轮询会话
//! 2. **新提交取代旧提交**：响应返回时若已有更新的提交，旧结果直接丢弃
//! 3. **整体替换**：同步结果和轮询结果都整体替换结果集

use crate::clients::{QaApi, QaClient};
use crate::config::Config;
use crate::error::AppResult;
use crate::models::{
    load_image, load_questions_file, ExportArtifact, ExportFormat, FilePreview, QaResult,
    QuestionEntry, SubmissionOutcome, SubmissionPayload, TokenUsage,
};
use crate::services::{ExportGateway, QuestionBatch, ResultSink, SubmissionDispatcher};
use crate::utils::truncate_text;
use crate::workflow::{PollController, PollState};
use serde_json::Value as JsonValue;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{info, warn};

/// 一次提交的处理结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitReport {
    /// 同步返回，结果集已替换
    Completed { result_count: usize },
    /// 异步任务已受理，正在轮询
    Polling {
        job_id: String,
        expected_count: Option<u64>,
    },
    /// 响应返回前已有更新的提交，本次结果被丢弃
    Superseded,
}

/// 提交控制器
///
/// 所有方法只需要 `&self`，可以放进 `Arc` 在多个任务间共享
pub struct QaController {
    api: Arc<dyn QaApi>,
    questions: Mutex<QuestionBatch>,
    dispatcher: SubmissionDispatcher,
    poll: PollController,
    sink: ResultSink,
    exporter: ExportGateway,
    /// 最新一次提交的序号
    epoch: Mutex<u64>,
}

impl QaController {
    pub fn new(api: Arc<dyn QaApi>, poll_interval: Duration) -> Self {
        let sink = ResultSink::new();
        Self {
            dispatcher: SubmissionDispatcher::new(Arc::clone(&api)),
            poll: PollController::new(Arc::clone(&api), sink.clone(), poll_interval),
            exporter: ExportGateway::new(Arc::clone(&api), sink.clone()),
            questions: Mutex::new(QuestionBatch::new()),
            sink,
            api,
            epoch: Mutex::new(0),
        }
    }

    /// 使用 HTTP 客户端创建
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = QaClient::new(config)?;
        Ok(Self::new(Arc::new(client), config.poll_interval()))
    }

    fn lock_questions(&self) -> MutexGuard<'_, QuestionBatch> {
        self.questions.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(|e| e.into_inner())
    }

    // ========== 题目批次 ==========

    pub fn add_question(&self, text: &str) -> AppResult<()> {
        self.lock_questions().add_one(text)
    }

    pub fn add_questions_bulk(&self, raw_block: &str) -> AppResult<usize> {
        let added = self.lock_questions().add_bulk(raw_block)?;
        info!("✓ 已添加 {} 道题目到批次", added);
        Ok(added)
    }

    pub fn remove_question(&self, index: usize) -> AppResult<QuestionEntry> {
        self.lock_questions().remove(index)
    }

    pub fn clear_questions(&self) {
        self.lock_questions().clear();
    }

    /// 当前批次的快照
    pub fn questions(&self) -> Vec<QuestionEntry> {
        self.lock_questions().entries().to_vec()
    }

    /// 读取题目文件并加入批次，返回添加数量
    pub async fn load_file_into_batch(&self, path: &Path) -> AppResult<usize> {
        let file = load_questions_file(path).await?;
        log_preview(&file.file_name, &file.preview());
        let block = file.questions.join("\n");
        self.add_questions_bulk(&block)
    }

    // ========== 提交 ==========

    /// 提交任意载荷
    ///
    /// 本地校验失败时直接返回，不影响正在进行的轮询
    pub async fn submit(&self, payload: SubmissionPayload) -> AppResult<SubmitReport> {
        payload.validate()?;

        let epoch = {
            let mut latest = self.lock_epoch();
            *latest += 1;
            // 发请求之前先让旧的轮询失效
            self.poll.cancel();
            *latest
        };

        let outcome = self.dispatcher.submit(payload).await?;

        let latest = self.lock_epoch();
        if *latest != epoch {
            warn!("⚠️ 提交 #{} 已被提交 #{} 取代，丢弃响应", epoch, *latest);
            return Ok(SubmitReport::Superseded);
        }

        let report = match outcome {
            SubmissionOutcome::Immediate(results) => {
                let result_count = results.len();
                self.sink.replace(results);
                SubmitReport::Completed { result_count }
            }
            SubmissionOutcome::Accepted {
                handle,
                expected_count,
            } => {
                let job_id = handle.job_id.clone();
                self.poll.start(handle, expected_count);
                SubmitReport::Polling {
                    job_id,
                    expected_count,
                }
            }
        };
        drop(latest);

        Ok(report)
    }

    /// 提交单道文字题
    pub async fn submit_text(&self, question: &str) -> AppResult<SubmitReport> {
        self.submit(SubmissionPayload::Text(question.trim().to_string()))
            .await
    }

    /// 提交题目图片
    pub async fn submit_image(&self, path: &Path) -> AppResult<SubmitReport> {
        let (bytes, filename) = load_image(path).await?;
        info!("🖼 正在处理图片: {}", filename);
        self.submit(SubmissionPayload::Image { bytes, filename })
            .await
    }

    /// 提交当前批次，成功后清空批次
    pub async fn submit_batch(&self, use_async_api: bool) -> AppResult<SubmitReport> {
        let entries = self.questions();
        let report = self
            .submit(SubmissionPayload::BatchList {
                entries,
                use_async_api,
            })
            .await?;

        self.clear_questions();
        Ok(report)
    }

    /// 直接上传题目文件
    pub async fn submit_file(&self, path: &Path, use_async_api: bool) -> AppResult<SubmitReport> {
        let file = load_questions_file(path).await?;
        log_preview(&file.file_name, &file.preview());

        self.submit(SubmissionPayload::BatchFile {
            bytes: file.bytes,
            filename: file.file_name,
            use_async_api,
        })
        .await
    }

    // ========== 轮询 ==========

    pub fn poll_state(&self) -> PollState {
        self.poll.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.poll.subscribe()
    }

    pub fn is_polling(&self) -> bool {
        self.poll.is_active()
    }

    pub async fn wait_until_settled(&self) -> PollState {
        self.poll.wait_until_settled().await
    }

    pub fn cancel_polling(&self) -> bool {
        self.poll.cancel()
    }

    // ========== 结果与导出 ==========

    pub fn results(&self) -> Arc<Vec<QaResult>> {
        self.sink.snapshot()
    }

    pub fn can_export(&self) -> bool {
        self.sink.can_export()
    }

    pub fn total_usage(&self) -> TokenUsage {
        self.sink.total_usage()
    }

    /// 导出当前结果集，结果集为空时返回 None 且不发请求
    pub async fn export(&self, format: ExportFormat) -> AppResult<Option<ExportArtifact>> {
        self.exporter.export(format).await
    }

    pub async fn download(&self, artifact: &ExportArtifact, dir: &Path) -> AppResult<PathBuf> {
        self.exporter.download(artifact, dir).await
    }

    /// 检查服务连通性
    pub async fn health_check(&self) -> AppResult<JsonValue> {
        self.api.health_check().await
    }
}

fn log_preview(file_name: &str, preview: &FilePreview) {
    info!("📁 题目文件: {}", file_name);
    for (idx, question) in preview.shown.iter().enumerate() {
        info!("  {}. {}", idx + 1, truncate_text(question, 60));
    }
    if let Some(hint) = preview.more_hint() {
        info!("  {}", hint);
    }
}
