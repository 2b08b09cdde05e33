//! 导出服务 - 业务能力层
//!
//! 把当前结果集交给服务端生成 PDF / DOCX，并可下载到本地

use crate::clients::{QaApi, EXPORT_ENDPOINT};
use crate::error::{AppError, AppResult};
use crate::models::{ExportArtifact, ExportFormat};
use crate::services::ResultSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// 导出服务
pub struct ExportGateway {
    api: Arc<dyn QaApi>,
    sink: ResultSink,
}

impl ExportGateway {
    pub fn new(api: Arc<dyn QaApi>, sink: ResultSink) -> Self {
        Self { api, sink }
    }

    /// 导出当前结果集
    ///
    /// 结果集为空时不发请求，返回 None
    pub async fn export(&self, format: ExportFormat) -> AppResult<Option<ExportArtifact>> {
        let results = self.sink.snapshot();
        if results.is_empty() {
            debug!("结果集为空，跳过导出");
            return Ok(None);
        }

        info!("📄 正在导出 {} 条结果为 {}...", results.len(), format);

        let response = self.api.export(&results, format).await?;

        let file_url = response
            .get("file_url")
            .and_then(|v| v.as_str())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AppError::protocol(EXPORT_ENDPOINT, "响应中没有 file_url"))?
            .to_string();

        let download_url = self.api.absolute_url(&file_url)?;

        info!("✓ 导出完成: {}", download_url);

        Ok(Some(ExportArtifact {
            file_url,
            download_url,
        }))
    }

    /// 下载导出文件到指定目录，返回保存路径
    pub async fn download(&self, artifact: &ExportArtifact, dir: &Path) -> AppResult<PathBuf> {
        let file_name = artifact.file_name().ok_or_else(|| {
            AppError::protocol(EXPORT_ENDPOINT, format!("无法从地址中取得文件名: {}", artifact.file_url))
        })?;

        let bytes = self.api.download(&artifact.file_url).await?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::file(dir.display().to_string(), e))?;

        let path = dir.join(file_name);
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::file(path.display().to_string(), e))?;

        info!("💾 已保存 {} ({} 字节)", path.display(), bytes.len());

        Ok(path)
    }
}
