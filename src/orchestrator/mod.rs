//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责把各项能力串成完整的提交流程，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 命令行应用
//! - 管理应用生命周期（初始化、运行）
//! - 按配置选择输入（图片 / 单题 / 题目文件）
//! - 等待异步任务结束、输出结果、导出下载
//! - 输出全局统计信息
//!
//! ### `qa_controller` - 提交控制器
//! - 持有题目批次、结果集和轮询控制器
//! - 提交前取消旧的轮询，新提交取代旧提交
//! - 同步结果直接替换结果集，异步任务交给轮询控制器
//!
//! ## 层次关系
//!
//! ```text
//! app (处理一次运行)
//!     ↓
//! qa_controller (处理一次提交)
//!     ↓
//! workflow::PollController (轮询单个任务)
//!     ↓
//! services (能力层：batch / dispatch / sink / export)
//!     ↓
//! clients (QaApi) → infrastructure (HttpTransport)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管运行，qa_controller 管提交
//! 2. **向下依赖**：编排层 → workflow → services → clients → infrastructure
//! 3. **无协议细节**：只做调度和统计，不解析响应

pub mod app;
pub mod qa_controller;

// 重新导出主要类型
pub use app::{App, RunMode};
pub use qa_controller::{QaController, SubmitReport};
