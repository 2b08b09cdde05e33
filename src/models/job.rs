//! 批处理任务相关类型
//!
//! `batch_status` 的响应在这里被归类为 [`PollStep`]，轮询层只处理这个枚举。

use crate::models::question::QaResult;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// 异步批处理任务句柄
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobHandle {
    pub job_id: String,
}

impl JobHandle {
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
        }
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[任务 {}]", self.job_id)
    }
}

/// 任务状态（名称与服务端一致，其余值原样保留）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending" => JobStatus::Pending,
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Other(raw) => raw,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `/batch_status/{job_id}` 的原始响应
///
/// 字段保留原始 JSON，终态判断不依赖结果能否解析
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BatchStatusResponse {
    #[serde(default)]
    pub status: Option<JsonValue>,
    #[serde(default)]
    pub results: Option<JsonValue>,
    #[serde(default)]
    pub error: Option<JsonValue>,
}

/// 一次状态查询的归类结果
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// 任务仍在处理中，携带用于显示的状态
    InProgress(JobStatus),
    /// 任务完成
    Completed(Vec<QaResult>),
    /// 任务级失败
    Failed(String),
}

impl From<BatchStatusResponse> for PollStep {
    fn from(response: BatchStatusResponse) -> Self {
        let status = match response.status {
            Some(JsonValue::String(raw)) => JobStatus::parse(&raw),
            None | Some(JsonValue::Null) => JobStatus::Other("unknown".to_string()),
            Some(other) => JobStatus::Other(other.to_string()),
        };

        // completed 且带 results 才算完成；completed 但缺 results 视为仍在处理
        if status == JobStatus::Completed {
            if let Some(results) = response.results.filter(|v| !v.is_null()) {
                return match serde_json::from_value::<Vec<QaResult>>(results) {
                    Ok(results) => PollStep::Completed(results),
                    Err(e) => PollStep::Failed(format!("响应格式无法识别: results 解析失败: {}", e)),
                };
            }
        }

        if let Some(error) = response.error.as_ref().filter(|e| is_truthy(e)) {
            return PollStep::Failed(error_message(error));
        }

        if status == JobStatus::Failed {
            return PollStep::Failed("任务状态为 failed".to_string());
        }

        PollStep::InProgress(status)
    }
}

// null、false、0、空字符串不算错误
fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map_or(true, |n| n != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

fn error_message(error: &JsonValue) -> String {
    match error {
        JsonValue::String(message) => message.clone(),
        JsonValue::Object(map) => match map.get("message") {
            Some(JsonValue::String(message)) => message.clone(),
            _ => error.to_string(),
        },
        other => other.to_string(),
    }
}

// job_id 可能是字符串也可能是整数，null 视为不存在
pub(crate) fn deserialize_optional_job_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::Visitor;

    struct JobIdVisitor;

    impl<'de> Visitor<'de> for JobIdVisitor {
        type Value = Option<String>;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer job id")
        }

        fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()).filter(|id| !id.trim().is_empty()))
        }

        fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(Some(value.to_string()))
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            Ok(None)
        }
    }

    deserializer.deserialize_any(JobIdVisitor)
}
