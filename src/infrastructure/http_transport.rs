//! HTTP 传输 - 基础设施层
//!
//! 持有唯一的 reqwest::Client，只暴露"发请求、拿 JSON"的能力

use crate::error::{AppError, AppResult};
use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::debug;

/// HTTP 传输
///
/// 职责：
/// - 持有唯一的 Client 和服务地址
/// - 把网络错误和非 2xx 响应统一映射为 Transport 错误
/// - 把无法解析的响应体映射为 Protocol 错误
/// - 不认识 Question / Result
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// 创建新的 HTTP 传输
    pub fn new(base_url: &str, connect_timeout: Duration, timeout: Duration) -> AppResult<Self> {
        let base_url = parse_base_url(base_url)?;

        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("无法创建 HTTP 客户端: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// 把相对地址拼接到服务地址上（绝对地址原样返回）
    pub fn resolve(&self, endpoint: &str) -> AppResult<Url> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| AppError::protocol(endpoint, format!("无效的地址: {}", e)))
    }

    /// 在接口地址后追加一段路径，段内的 / ? # 等字符会被转义
    pub fn resolve_segment(&self, endpoint: &str, segment: &str) -> AppResult<Url> {
        let mut url = self.resolve(endpoint)?;
        url.path_segments_mut()
            .map_err(|_| AppError::protocol(endpoint, "地址不能追加路径"))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    /// POST JSON 请求体
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> AppResult<JsonValue> {
        let url = self.resolve(endpoint)?;
        self.send_json(endpoint, self.client.post(url).json(body)).await
    }

    /// POST multipart 表单
    pub async fn post_multipart(&self, endpoint: &str, form: Form) -> AppResult<JsonValue> {
        let url = self.resolve(endpoint)?;
        self.send_json(endpoint, self.client.post(url).multipart(form))
            .await
    }

    /// GET 并解析 JSON
    pub async fn get_json(&self, endpoint: &str) -> AppResult<JsonValue> {
        let url = self.resolve(endpoint)?;
        self.send_json(endpoint, self.client.get(url)).await
    }

    /// GET `endpoint/segment` 并解析 JSON
    pub async fn get_json_segment(&self, endpoint: &str, segment: &str) -> AppResult<JsonValue> {
        let url = self.resolve_segment(endpoint, segment)?;
        self.send_json(endpoint, self.client.get(url)).await
    }

    /// GET 原始字节（下载导出文件）
    pub async fn get_bytes(&self, endpoint: &str) -> AppResult<Vec<u8>> {
        let url = self.resolve(endpoint)?;
        let response = self.send(endpoint, self.client.get(url)).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::transport_failed(endpoint, e))?;
        Ok(bytes.to_vec())
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> AppResult<reqwest::Response> {
        debug!("发送请求: {}", endpoint);

        let response = request
            .send()
            .await
            .map_err(|e| AppError::transport_failed(endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::bad_status(endpoint, status.as_u16(), body));
        }

        Ok(response)
    }

    async fn send_json(&self, endpoint: &str, request: RequestBuilder) -> AppResult<JsonValue> {
        let response = self.send(endpoint, request).await?;
        let text = response
            .text()
            .await
            .map_err(|e| AppError::transport_failed(endpoint, e))?;

        debug!("响应 {}: {} 字节", endpoint, text.len());

        serde_json::from_str(&text)
            .map_err(|e| AppError::protocol(endpoint, format!("JSON解析失败: {}", e)))
    }
}

// 以 / 结尾，保证 join 时保留路径前缀
fn parse_base_url(base_url: &str) -> AppResult<Url> {
    let trimmed = base_url.trim();
    let normalized = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&normalized)
        .map_err(|e| AppError::Config(format!("无效的服务地址 {}: {}", base_url, e)))
}
