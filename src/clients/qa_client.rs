/// 推理服务 API 客户端
///
/// 封装所有与推理服务相关的 HTTP 调用
use crate::clients::{
    QaApi, API_TEST_ENDPOINT, BATCH_STATUS_ENDPOINT, EXPORT_ENDPOINT, PROCESS_ENDPOINT,
    PROCESS_FILE_ENDPOINT, PROCESS_IMAGE_ENDPOINT,
};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::HttpTransport;
use crate::models::{ExportFormat, ExportRequest, ProcessRequest, QaResult};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde_json::Value as JsonValue;
use tracing::debug;

/// 推理服务客户端
pub struct QaClient {
    transport: HttpTransport,
}

impl QaClient {
    /// 创建新的推理服务客户端
    pub fn new(config: &Config) -> AppResult<Self> {
        let transport = HttpTransport::new(
            &config.api_base_url,
            config.connect_timeout(),
            config.request_timeout(),
        )?;
        Ok(Self { transport })
    }

    /// 构建文件上传部分
    fn file_part(bytes: Vec<u8>, filename: &str, mime: &str) -> AppResult<Part> {
        Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(mime)
            .map_err(|e| AppError::validation(format!("无效的文件类型 {}: {}", mime, e)))
    }
}

#[async_trait]
impl QaApi for QaClient {
    async fn process(&self, request: &ProcessRequest) -> AppResult<JsonValue> {
        debug!("提交 /process 请求: {:?}", request);
        self.transport.post_json(PROCESS_ENDPOINT, request).await
    }

    async fn process_image(&self, bytes: Vec<u8>, filename: &str) -> AppResult<JsonValue> {
        debug!("上传图片 {} ({} 字节)", filename, bytes.len());
        let part = Self::file_part(bytes, filename, image_mime(filename))?;
        let form = Form::new().part("image", part);
        self.transport
            .post_multipart(PROCESS_IMAGE_ENDPOINT, form)
            .await
    }

    async fn process_file(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        use_batch_api: bool,
    ) -> AppResult<JsonValue> {
        debug!(
            "上传题目文件 {} ({} 字节, 异步: {})",
            filename,
            bytes.len(),
            use_batch_api
        );
        let part = Self::file_part(bytes, filename, "text/plain")?;
        let form = Form::new()
            .part("file", part)
            .text("use_batch_api", use_batch_api.to_string());
        self.transport
            .post_multipart(PROCESS_FILE_ENDPOINT, form)
            .await
    }

    async fn batch_status(&self, job_id: &str) -> AppResult<JsonValue> {
        self.transport
            .get_json_segment(BATCH_STATUS_ENDPOINT, job_id)
            .await
    }

    async fn export(&self, results: &[QaResult], format: ExportFormat) -> AppResult<JsonValue> {
        let request = ExportRequest { results, format };
        self.transport.post_json(EXPORT_ENDPOINT, &request).await
    }

    async fn health_check(&self) -> AppResult<JsonValue> {
        self.transport.get_json(API_TEST_ENDPOINT).await
    }

    async fn download(&self, file_url: &str) -> AppResult<Vec<u8>> {
        self.transport.get_bytes(file_url).await
    }

    fn absolute_url(&self, file_url: &str) -> AppResult<String> {
        Ok(self.transport.resolve(file_url)?.to_string())
    }
}

/// 根据扩展名推断图片 MIME
fn image_mime(filename: &str) -> &'static str {
    match filename
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}
