//! 提交载荷与服务端响应
//!
//! 服务端有两种完成方式：同步直接返回结果，或返回 job_id 需要轮询。
//! 两者在边界处统一归类为 [`SubmissionOutcome`]。

use crate::error::{AppError, AppResult};
use crate::models::job::{deserialize_optional_job_id, JobHandle};
use crate::models::question::{QaResult, QuestionEntry, TokenUsage};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 一次提交的载荷，每次提交恰好一种
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionPayload {
    /// 单道文字题
    Text(String),
    /// 题目图片（服务端 OCR）
    Image { bytes: Vec<u8>, filename: String },
    /// 手动录入的一批题目
    BatchList {
        entries: Vec<QuestionEntry>,
        use_async_api: bool,
    },
    /// 整个题目文件（.txt，每行一题）
    BatchFile {
        bytes: Vec<u8>,
        filename: String,
        use_async_api: bool,
    },
}

impl SubmissionPayload {
    /// 发请求前的本地校验：空白题目、空批次
    pub fn validate(&self) -> AppResult<()> {
        match self {
            SubmissionPayload::Text(question) if question.trim().is_empty() => {
                Err(AppError::validation("请输入题目"))
            }
            SubmissionPayload::BatchList { entries, .. } if entries.is_empty() => {
                Err(AppError::validation("批次中没有题目"))
            }
            _ => Ok(()),
        }
    }

    /// 日志里使用的简短描述
    pub fn describe(&self) -> String {
        match self {
            SubmissionPayload::Text(_) => "单题".to_string(),
            SubmissionPayload::Image { filename, .. } => format!("图片 {}", filename),
            SubmissionPayload::BatchList {
                entries,
                use_async_api,
            } => format!("批量 {} 题 (异步: {})", entries.len(), use_async_api),
            SubmissionPayload::BatchFile {
                filename,
                use_async_api,
                ..
            } => format!("文件 {} (异步: {})", filename, use_async_api),
        }
    }
}

/// `/process` 的请求体
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProcessRequest {
    Single {
        question: String,
    },
    Batch {
        questions: Vec<String>,
        use_batch_api: bool,
    },
}

/// 提交结果的归类
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// 同步返回的完整结果
    Immediate(Vec<QaResult>),
    /// 服务端已接受异步任务
    Accepted {
        handle: JobHandle,
        expected_count: Option<u64>,
    },
}

/// 所有提交端点共用的原始响应形状
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSubmissionResponse {
    #[serde(default, deserialize_with = "deserialize_optional_job_id")]
    pub job_id: Option<String>,
    #[serde(default)]
    pub question_count: Option<u64>,
    #[serde(default)]
    pub results: Option<Vec<QaResult>>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub token_usage: Option<TokenUsage>,
    #[serde(default)]
    pub error: Option<String>,
}

/// 导出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(AppError::validation(format!(
                "不支持的导出格式: {} (可选 pdf / docx)",
                other
            ))),
        }
    }
}

/// `/export` 的请求体
#[derive(Debug, Clone, Serialize)]
pub struct ExportRequest<'a> {
    pub results: &'a [QaResult],
    pub format: ExportFormat,
}

/// 导出产物
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    /// 服务端返回的原始地址（通常是 `/download/<name>`）
    pub file_url: String,
    /// 拼接服务地址后的完整下载地址
    pub download_url: String,
}

impl ExportArtifact {
    /// 从地址中取出文件名
    pub fn file_name(&self) -> Option<&str> {
        self.file_url
            .rsplit('/')
            .next()
            .map(|name| name.split('?').next().unwrap_or(name))
            .filter(|name| !name.is_empty())
    }
}
