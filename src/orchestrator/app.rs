//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 按配置完成一次完整的提交流程，是命令行程序的"指挥中心"。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：写日志文件头、创建 HTTP 客户端、检查服务连通性
//! 2. **选择输入**：图片 / 单题 / 题目文件（直接上传或拆分后批量提交）
//! 3. **等待结果**：异步任务由轮询控制器驱动，直到完成或失败
//! 4. **输出结果**：控制台输出、追加到日志文件
//! 5. **导出下载**：配置了导出格式时生成并下载文件
//! 6. **全局统计**：结果数量和 token 用量合计
//!
//! ## 设计特点
//!
//! - **顶层编排**：不关心请求细节，全部委托给 [`QaController`]
//! - **单次运行**：一次 `run` 只处理一种输入

use crate::config::Config;
use crate::error::AppError;
use crate::orchestrator::{QaController, SubmitReport};
use crate::utils::logging::{
    append_results_to_log, init_log_file, log_results, log_startup, print_final_stats,
};
use crate::workflow::PollState;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// 本次运行的输入来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Image(PathBuf),
    Question(String),
    QuestionsFile { path: PathBuf, direct_upload: bool },
}

impl RunMode {
    /// 按 图片 → 单题 → 题目文件 的优先级选择输入
    pub fn from_config(config: &Config) -> Option<Self> {
        let non_empty = |value: &Option<String>| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if let Some(path) = non_empty(&config.image_path) {
            return Some(RunMode::Image(PathBuf::from(path)));
        }
        if let Some(question) = non_empty(&config.question) {
            return Some(RunMode::Question(question));
        }
        non_empty(&config.questions_file).map(|path| RunMode::QuestionsFile {
            path: PathBuf::from(path),
            direct_upload: config.submit_file_directly,
        })
    }
}

/// 应用主结构
pub struct App {
    config: Config,
    controller: QaController,
}

impl App {
    /// 初始化应用
    pub async fn initialize(config: Config) -> Result<Self> {
        // 初始化日志文件
        init_log_file(&config.output_log_file)
            .with_context(|| format!("无法创建日志文件: {}", config.output_log_file))?;

        log_startup(&config);

        let controller = QaController::from_config(&config).context("创建推理服务客户端失败")?;

        match controller.health_check().await {
            Ok(body) => info!("✓ 服务连接正常: {}", body),
            Err(e) => warn!("⚠️ 服务连通性检查失败，继续运行: {}", e),
        }

        Ok(Self { config, controller })
    }

    /// 使用已有控制器创建，不做连通性检查
    pub fn with_controller(config: Config, controller: QaController) -> Self {
        Self { config, controller }
    }

    pub fn controller(&self) -> &QaController {
        &self.controller
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<()> {
        let Some(mode) = RunMode::from_config(&self.config) else {
            warn!("⚠️ 没有配置 QUESTION / IMAGE_PATH / QUESTIONS_FILE，程序结束");
            return Ok(());
        };

        let report = self.submit(&mode).await?;
        self.settle(report).await?;

        let results = self.controller.results();
        if results.is_empty() {
            warn!("⚠️ 没有得到任何结果");
        } else {
            log_results(&results, self.config.verbose_logging);
            append_results_to_log(&self.config.output_log_file, &results).with_context(|| {
                format!("无法写入日志文件: {}", self.config.output_log_file)
            })?;
        }

        let export_path = self.export_if_configured().await?;

        print_final_stats(
            results.len(),
            &self.controller.total_usage(),
            export_path.as_deref(),
            &self.config.output_log_file,
        );

        Ok(())
    }

    /// 提交输入
    async fn submit(&self, mode: &RunMode) -> Result<SubmitReport> {
        let use_async = self.config.use_batch_api;

        let report = match mode {
            RunMode::Image(path) => self.controller.submit_image(path).await?,
            RunMode::Question(question) => {
                info!("📨 正在提交单道题目...");
                self.controller.submit_text(question).await?
            }
            RunMode::QuestionsFile {
                path,
                direct_upload: true,
            } => {
                info!("📨 正在上传题目文件...");
                self.controller.submit_file(path, use_async).await?
            }
            RunMode::QuestionsFile {
                path,
                direct_upload: false,
            } => {
                self.controller.load_file_into_batch(path).await?;
                info!(
                    "📨 正在批量提交 {} 道题目...",
                    self.controller.questions().len()
                );
                self.controller.submit_batch(use_async).await?
            }
        };

        log_submit_report(&report);
        Ok(report)
    }

    /// 异步任务时等待轮询结束
    async fn settle(&self, report: SubmitReport) -> Result<()> {
        if !matches!(report, SubmitReport::Polling { .. }) {
            return Ok(());
        }

        match self.controller.wait_until_settled().await {
            PollState::Resolved {
                job_id,
                result_count,
            } => {
                info!("✓ [任务 {}] 完成，共 {} 条结果", job_id, result_count);
                Ok(())
            }
            PollState::Failed { job_id, message } => {
                error!("❌ [任务 {}] 失败: {}", job_id, message);
                Err(AppError::Job { job_id, message }.into())
            }
            PollState::Idle => {
                warn!("⚠️ 轮询已被取消");
                Ok(())
            }
            PollState::Polling { .. } => Ok(()),
        }
    }

    /// 配置了导出格式时导出并下载
    async fn export_if_configured(&self) -> Result<Option<PathBuf>> {
        let Some(format) = self.config.export_format()? else {
            return Ok(None);
        };

        let Some(artifact) = self.controller.export(format).await? else {
            warn!("⚠️ 没有可导出的结果，跳过导出");
            return Ok(None);
        };

        let path = self
            .controller
            .download(&artifact, Path::new(&self.config.download_dir))
            .await?;

        Ok(Some(path))
    }
}

// ========== 日志辅助函数 ==========

fn log_submit_report(report: &SubmitReport) {
    match report {
        SubmitReport::Completed { result_count } => {
            info!("✓ 同步返回 {} 条结果", result_count);
        }
        SubmitReport::Polling {
            job_id,
            expected_count: Some(count),
        } => {
            info!("⏳ [任务 {}] 已受理 {} 道题目，开始轮询", job_id, count);
        }
        SubmitReport::Polling { job_id, .. } => {
            info!("⏳ [任务 {}] 已受理，开始轮询", job_id);
        }
        SubmitReport::Superseded => {
            warn!("⚠️ 本次提交已被取代");
        }
    }
}
