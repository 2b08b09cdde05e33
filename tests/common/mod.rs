//! 集成测试用的脚本化服务端
#![allow(dead_code)]

use async_trait::async_trait;
use question_batch_submit::clients::QaApi;
use question_batch_submit::error::{AppError, AppResult};
use question_batch_submit::models::{ExportFormat, ProcessRequest, QaResult};
use serde_json::{json, Value as JsonValue};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// 服务端收到的一次调用
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Process(ProcessRequest),
    ProcessImage { filename: String, size: usize },
    ProcessFile { filename: String, use_batch_api: bool },
    BatchStatus(String),
    Export { count: usize, format: ExportFormat },
    HealthCheck,
    Download(String),
}

/// 一条预设响应，可以带延迟
pub struct Scripted {
    delay: Duration,
    response: AppResult<JsonValue>,
}

impl Scripted {
    pub fn ok(body: JsonValue) -> Self {
        Self {
            delay: Duration::ZERO,
            response: Ok(body),
        }
    }

    pub fn err(error: AppError) -> Self {
        Self {
            delay: Duration::ZERO,
            response: Err(error),
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// 按端点排队的假服务端
#[derive(Default)]
pub struct ScriptedApi {
    submissions: Mutex<VecDeque<Scripted>>,
    statuses: Mutex<HashMap<String, VecDeque<JsonValue>>>,
    exports: Mutex<VecDeque<Scripted>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// /process、/process_image、/process_file 共用一个队列
    pub fn push_submission(&self, scripted: Scripted) {
        self.submissions.lock().unwrap().push_back(scripted);
    }

    /// 某个任务的状态序列，用完后一直返回 running
    pub fn push_status(&self, job_id: &str, body: JsonValue) {
        self.statuses
            .lock()
            .unwrap()
            .entry(job_id.to_string())
            .or_default()
            .push_back(body);
    }

    pub fn push_export(&self, scripted: Scripted) {
        self.exports.lock().unwrap().push_back(scripted);
    }

    pub fn put_file(&self, file_url: &str, bytes: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(file_url.to_string(), bytes.to_vec());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// 某个任务被查询的次数
    pub fn status_calls(&self, job_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::BatchStatus(id) if id == job_id))
            .count()
    }

    pub fn export_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Export { .. }))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn next_submission(&self) -> AppResult<JsonValue> {
        let scripted = self
            .submissions
            .lock()
            .unwrap()
            .pop_front()
            .expect("没有预设的提交响应");
        if !scripted.delay.is_zero() {
            tokio::time::sleep(scripted.delay).await;
        }
        scripted.response
    }
}

#[async_trait]
impl QaApi for ScriptedApi {
    async fn process(&self, request: &ProcessRequest) -> AppResult<JsonValue> {
        self.record(Call::Process(request.clone()));
        self.next_submission().await
    }

    async fn process_image(&self, bytes: Vec<u8>, filename: &str) -> AppResult<JsonValue> {
        self.record(Call::ProcessImage {
            filename: filename.to_string(),
            size: bytes.len(),
        });
        self.next_submission().await
    }

    async fn process_file(
        &self,
        _bytes: Vec<u8>,
        filename: &str,
        use_batch_api: bool,
    ) -> AppResult<JsonValue> {
        self.record(Call::ProcessFile {
            filename: filename.to_string(),
            use_batch_api,
        });
        self.next_submission().await
    }

    async fn batch_status(&self, job_id: &str) -> AppResult<JsonValue> {
        self.record(Call::BatchStatus(job_id.to_string()));
        let next = self
            .statuses
            .lock()
            .unwrap()
            .get_mut(job_id)
            .and_then(|queue| queue.pop_front());
        Ok(next.unwrap_or_else(|| json!({"status": "running"})))
    }

    async fn export(&self, results: &[QaResult], format: ExportFormat) -> AppResult<JsonValue> {
        self.record(Call::Export {
            count: results.len(),
            format,
        });
        let scripted = self
            .exports
            .lock()
            .unwrap()
            .pop_front()
            .expect("没有预设的导出响应");
        scripted.response
    }

    async fn health_check(&self) -> AppResult<JsonValue> {
        self.record(Call::HealthCheck);
        Ok(json!({"status": "ok"}))
    }

    async fn download(&self, file_url: &str) -> AppResult<Vec<u8>> {
        self.record(Call::Download(file_url.to_string()));
        self.files
            .lock()
            .unwrap()
            .get(file_url)
            .cloned()
            .ok_or_else(|| AppError::bad_status(file_url, 404, "not found"))
    }

    fn absolute_url(&self, file_url: &str) -> AppResult<String> {
        Ok(format!("http://qa.test{}", file_url))
    }
}
