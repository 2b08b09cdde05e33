//! 提交分发 - 业务能力层
//!
//! 每次提交只发一个请求，并把响应归类为 Immediate / Accepted。
//! 不安装轮询、不替换结果，这些由调用方负责。

use crate::clients::{QaApi, PROCESS_ENDPOINT, PROCESS_FILE_ENDPOINT, PROCESS_IMAGE_ENDPOINT};
use crate::error::{AppError, AppResult};
use crate::models::{
    JobHandle, ProcessRequest, QaResult, RawSubmissionResponse, SubmissionOutcome,
    SubmissionPayload,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info};

/// 提交分发器
pub struct SubmissionDispatcher {
    api: Arc<dyn QaApi>,
}

impl SubmissionDispatcher {
    pub fn new(api: Arc<dyn QaApi>) -> Self {
        Self { api }
    }

    /// 发送一次提交并归类响应
    pub async fn submit(&self, payload: SubmissionPayload) -> AppResult<SubmissionOutcome> {
        payload.validate()?;
        info!("📤 提交: {}", payload.describe());

        let (endpoint, response) = match payload {
            SubmissionPayload::Text(question) => {
                let question = question.trim().to_string();
                let request = ProcessRequest::Single { question };
                (PROCESS_ENDPOINT, self.api.process(&request).await?)
            }
            SubmissionPayload::Image { bytes, filename } => (
                PROCESS_IMAGE_ENDPOINT,
                self.api.process_image(bytes, &filename).await?,
            ),
            SubmissionPayload::BatchList {
                entries,
                use_async_api,
            } => {
                let request = ProcessRequest::Batch {
                    questions: entries.into_iter().map(|e| e.text).collect(),
                    use_batch_api: use_async_api,
                };
                (PROCESS_ENDPOINT, self.api.process(&request).await?)
            }
            SubmissionPayload::BatchFile {
                bytes,
                filename,
                use_async_api,
            } => (
                PROCESS_FILE_ENDPOINT,
                self.api
                    .process_file(bytes, &filename, use_async_api)
                    .await?,
            ),
        };

        let outcome = classify_response(endpoint, response)?;
        match &outcome {
            SubmissionOutcome::Immediate(results) => {
                info!("✓ 同步返回 {} 条结果", results.len());
            }
            SubmissionOutcome::Accepted {
                handle,
                expected_count,
            } => {
                info!("✓ 批处理任务已提交 {} (题目数: {:?})", handle, expected_count);
            }
        }
        Ok(outcome)
    }
}

/// 把提交端点的响应归类
///
/// 有 job_id 即为 Accepted；否则有 results 即为 Immediate；
/// 单题形状 `{question, answer}` 归一成一条结果；其余都是 Protocol 错误
pub fn classify_response(endpoint: &str, response: JsonValue) -> AppResult<SubmissionOutcome> {
    debug!("归类响应 {}: {}", endpoint, response);

    let raw: RawSubmissionResponse = serde_json::from_value(response)
        .map_err(|e| AppError::protocol(endpoint, format!("JSON解析失败: {}", e)))?;

    if let Some(job_id) = raw.job_id {
        return Ok(SubmissionOutcome::Accepted {
            handle: JobHandle::new(job_id),
            expected_count: raw.question_count,
        });
    }

    if let Some(results) = raw.results {
        return Ok(SubmissionOutcome::Immediate(results));
    }

    if let (Some(question), Some(answer)) = (raw.question, raw.answer) {
        let mut result = QaResult::new(question, answer);
        result.token_usage = raw.token_usage;
        return Ok(SubmissionOutcome::Immediate(vec![result]));
    }

    match raw.error {
        Some(error) => Err(AppError::protocol(endpoint, error)),
        None => Err(AppError::protocol(endpoint, "no results returned")),
    }
}
