//! 错误类型
//!
//! 库代码统一返回 [`AppResult`]，二进制入口和 `App` 使用 `anyhow` 包装。

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 本地输入不合法（空题目、空文件、不支持的扩展名等），由用户重新输入
    #[error("输入校验失败: {0}")]
    Validation(String),

    /// 题目列表下标越界
    #[error("索引 {index} 超出范围 (共 {len} 道题目)")]
    Index { index: usize, len: usize },

    /// 网络错误或非 2xx 响应，不会自动重试
    #[error("请求失败 ({endpoint}): status={status:?}, {message}")]
    Transport {
        endpoint: String,
        status: Option<u16>,
        message: String,
    },

    /// 响应结构无法识别
    #[error("响应格式无法识别 ({endpoint}): {message}")]
    Protocol { endpoint: String, message: String },

    /// 批处理任务本身失败（batch_status 返回 error 或 failed）
    #[error("批处理任务失败 (任务 {job_id}): {message}")]
    Job { job_id: String, message: String },

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 文件读写失败
    #[error("文件操作失败 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建输入校验错误
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into())
    }

    /// 创建网络请求失败错误（无 HTTP 状态码）
    pub fn transport_failed(endpoint: impl Into<String>, source: impl std::fmt::Display) -> Self {
        AppError::Transport {
            endpoint: endpoint.into(),
            status: None,
            message: source.to_string(),
        }
    }

    /// 创建非 2xx 响应错误
    pub fn bad_status(endpoint: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        AppError::Transport {
            endpoint: endpoint.into(),
            status: Some(status),
            message: body.into(),
        }
    }

    /// 创建响应格式错误
    pub fn protocol(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Protocol {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// 创建文件错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }

    /// 是否为网络层错误
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Transport { .. })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
