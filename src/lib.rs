//! # Question Batch Submit
//!
//! 把题目（文字、图片、题目列表或题目文件）提交给远端推理服务的客户端
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（HTTP 连接池），只暴露能力
//! - `HttpTransport` - 唯一的 `reqwest::Client` owner，提供 JSON / multipart / 下载能力
//!
//! ### ② 客户端层（Clients）
//! - `clients/` - 服务端点的抽象
//! - `QaApi` - 端点 trait，测试时可替换
//! - `QaClient` - 基于 HTTP 的实现
//!
//! ### ③ 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `QuestionBatch` - 题目批次的增删
//! - `SubmissionDispatcher` - 选择端点并把响应分类为同步结果或异步任务
//! - `ResultSink` - 当前结果集，只做整体替换
//! - `ExportGateway` - 导出 PDF / DOCX 并下载
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - 单个异步任务的轮询流程
//! - `PollSession` - 会话封装（任务 + 代数 + 取消令牌）
//! - `PollController` - 固定间隔轮询，同一时刻最多一个会话
//!
//! ### ⑤ 编排层（Orchestration）
//! - `orchestrator/qa_controller` - 提交控制器，串联以上各层
//! - `orchestrator/app` - 命令行应用，管理一次完整运行
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{QaApi, QaClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::HttpTransport;
pub use models::{
    ExportArtifact, ExportFormat, JobHandle, QaResult, QuestionEntry, SubmissionOutcome,
    SubmissionPayload, TokenUsage,
};
pub use orchestrator::{App, QaController, SubmitReport};
pub use workflow::{PollController, PollState};
