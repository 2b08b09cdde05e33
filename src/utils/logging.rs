//! 日志工具模块
//!
//! 提供日志格式化和输出的辅助函数

use crate::config::Config;
use crate::models::{QaResult, TokenUsage};
use anyhow::Result;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;
use tracing::info;

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n题目提交日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 题目提交模式");
    info!("🌐 服务地址: {}", config.api_base_url);
    info!("⏱ 轮询间隔: {} 秒", config.poll_interval_secs);
    info!(
        "📋 批量接口: {}",
        if config.use_batch_api { "异步" } else { "同步" }
    );
    info!("{}", "=".repeat(60));
}

/// 把结果集追加写入日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
/// - `results`: 当前结果集
pub fn append_results_to_log(log_file_path: &str, results: &[QaResult]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file_path)?;

    writeln!(
        file,
        "[{}] 共 {} 条结果",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        results.len()
    )?;

    for (idx, result) in results.iter().enumerate() {
        writeln!(file, "{}", "-".repeat(60))?;
        writeln!(file, "题目 {}: {}", idx + 1, result.question)?;
        writeln!(file, "答案: {}", result.answer)?;
        if let Some(usage) = &result.token_usage {
            writeln!(
                file,
                "Token: 输入 {} / 输出 {} / 合计 {}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            )?;
        }
    }
    writeln!(file)?;

    Ok(())
}

/// 在控制台输出结果集
///
/// # 参数
/// - `results`: 当前结果集
/// - `verbose`: 是否输出完整答案
pub fn log_results(results: &[QaResult], verbose: bool) {
    info!("\n{}", "─".repeat(60));
    info!("📝 共 {} 条结果", results.len());
    for (idx, result) in results.iter().enumerate() {
        info!("题目 {}: {}", idx + 1, truncate_text(&result.question, 60));
        if verbose {
            info!("答案: {}", result.answer);
        } else {
            info!("答案: {}", truncate_text(&result.answer, 120));
        }
    }
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `result_count`: 结果数量
/// - `usage`: token 用量合计
/// - `export_path`: 导出文件的保存路径
/// - `log_file_path`: 日志文件路径
pub fn print_final_stats(
    result_count: usize,
    usage: &TokenUsage,
    export_path: Option<&Path>,
    log_file_path: &str,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 结果数量: {}", result_count);
    info!(
        "🔢 Token: 输入 {} / 输出 {} / 合计 {}",
        usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
    );
    if let Some(path) = export_path {
        info!("📄 导出文件: {}", path.display());
    }
    info!("{}", "=".repeat(60));
    info!("\n日志已保存至: {}", log_file_path);
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度（按字符计）
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
