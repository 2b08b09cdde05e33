//! 推理服务 API
//!
//! [`QaApi`] 描述服务端暴露的端点，[`QaClient`] 是基于 HTTP 的实现。
//! 上层只依赖 trait，测试时可以替换为脚本化的实现。

pub mod qa_client;

pub use qa_client::QaClient;

use crate::error::AppResult;
use crate::models::{ExportFormat, ProcessRequest, QaResult};
use async_trait::async_trait;
use serde_json::Value as JsonValue;

pub const PROCESS_ENDPOINT: &str = "/process";
pub const PROCESS_IMAGE_ENDPOINT: &str = "/process_image";
pub const PROCESS_FILE_ENDPOINT: &str = "/process_file";
pub const BATCH_STATUS_ENDPOINT: &str = "/batch_status";
pub const EXPORT_ENDPOINT: &str = "/export";
pub const API_TEST_ENDPOINT: &str = "/api_test";

/// 推理服务端点
///
/// 所有方法返回原始 JSON，响应的归类由调用方负责
#[async_trait]
pub trait QaApi: Send + Sync {
    /// POST /process
    async fn process(&self, request: &ProcessRequest) -> AppResult<JsonValue>;

    /// POST /process_image (multipart: image)
    async fn process_image(&self, bytes: Vec<u8>, filename: &str) -> AppResult<JsonValue>;

    /// POST /process_file (multipart: file, use_batch_api)
    async fn process_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        use_batch_api: bool,
    ) -> AppResult<JsonValue>;

    /// GET /batch_status/{job_id}
    async fn batch_status(&self, job_id: &str) -> AppResult<JsonValue>;

    /// POST /export
    async fn export(&self, results: &[QaResult], format: ExportFormat) -> AppResult<JsonValue>;

    /// GET /api_test，检查服务端与上游模型的连通性
    async fn health_check(&self) -> AppResult<JsonValue>;

    /// 下载导出文件
    async fn download(&self, file_url: &str) -> AppResult<Vec<u8>>;

    /// 把服务端返回的相对地址转成完整地址
    fn absolute_url(&self, file_url: &str) -> AppResult<String>;
}
