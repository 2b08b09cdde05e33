use crate::error::{AppError, AppResult};
use crate::models::ExportFormat;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// 默认的配置文件路径（可通过 `QA_CONFIG_FILE` 覆盖）
pub const DEFAULT_CONFIG_FILE: &str = "qa_client.toml";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 推理服务地址
    pub api_base_url: String,
    /// 批处理任务轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// 建立连接超时（秒）
    pub connect_timeout_secs: u64,
    /// 单个请求超时（秒）
    pub request_timeout_secs: u64,
    /// 是否使用异步批处理 API
    pub use_batch_api: bool,
    /// 直接上传题目文件（/process_file），而不是在本地拆分后按批次提交
    pub submit_file_directly: bool,
    // --- 本次运行的输入，三选一 ---
    pub question: Option<String>,
    pub image_path: Option<String>,
    pub questions_file: Option<String>,
    // --- 导出 ---
    /// pdf / docx，不设置则不导出
    pub export_format: Option<String>,
    pub download_dir: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".to_string(),
            poll_interval_secs: 5,
            connect_timeout_secs: 10,
            request_timeout_secs: 120,
            use_batch_api: false,
            submit_file_directly: false,
            question: None,
            image_path: None,
            questions_file: None,
            export_format: None,
            download_dir: "exports".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    /// 只使用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 先读取 TOML 配置文件，再用环境变量覆盖；配置文件不存在时等同于 `from_env`
    pub fn load() -> AppResult<Self> {
        let path = std::env::var("QA_CONFIG_FILE").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let config = if Path::new(&path).exists() {
            Self::from_toml_file(&path)?.with_env_overrides()
        } else {
            Self::from_env()
        };
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载配置
    pub fn from_toml_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AppError::file(path, e))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        toml::from_str(content).map_err(|e| AppError::Config(format!("无法解析配置文件: {}", e)))
    }

    fn with_env_overrides(self) -> Self {
        let default = self;
        Self {
            api_base_url: std::env::var("QA_API_BASE_URL").unwrap_or(default.api_base_url),
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.poll_interval_secs),
            connect_timeout_secs: std::env::var("CONNECT_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.connect_timeout_secs),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(default.request_timeout_secs),
            use_batch_api: std::env::var("USE_BATCH_API").ok().and_then(|v| v.parse().ok()).unwrap_or(default.use_batch_api),
            submit_file_directly: std::env::var("SUBMIT_FILE_DIRECTLY").ok().and_then(|v| v.parse().ok()).unwrap_or(default.submit_file_directly),
            question: std::env::var("QUESTION").ok().or(default.question),
            image_path: std::env::var("IMAGE_PATH").ok().or(default.image_path),
            questions_file: std::env::var("QUESTIONS_FILE").ok().or(default.questions_file),
            export_format: std::env::var("EXPORT_FORMAT").ok().or(default.export_format),
            download_dir: std::env::var("DOWNLOAD_DIR").unwrap_or(default.download_dir),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            output_log_file: std::env::var("OUTPUT_LOG_FILE").unwrap_or(default.output_log_file),
        }
    }

    /// 校验配置
    pub fn validate(&self) -> AppResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(AppError::Config("api_base_url 不能为空".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(AppError::Config("poll_interval_secs 必须大于 0".to_string()));
        }
        self.export_format()
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// 解析导出格式，未配置时返回 None
    pub fn export_format(&self) -> AppResult<Option<ExportFormat>> {
        self.export_format
            .as_deref()
            .map(str::parse::<ExportFormat>)
            .transpose()
    }
}
