use crate::error::{AppError, AppResult};
use std::path::Path;
use tokio::fs;

/// 预览中最多显示的题目数量
pub const PREVIEW_LIMIT: usize = 10;

/// 支持的图片扩展名
pub const IMAGE_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// 已读取的题目文件
#[derive(Debug, Clone)]
pub struct QuestionFile {
    pub file_name: String,
    /// 原始内容，直接上传到 /process_file 时使用
    pub bytes: Vec<u8>,
    /// 去掉空行并 trim 后的题目
    pub questions: Vec<String>,
}

/// 题目文件预览
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePreview {
    pub shown: Vec<String>,
    pub remaining: usize,
}

impl QuestionFile {
    pub fn preview(&self) -> FilePreview {
        FilePreview {
            shown: self.questions.iter().take(PREVIEW_LIMIT).cloned().collect(),
            remaining: self.questions.len().saturating_sub(PREVIEW_LIMIT),
        }
    }
}

impl FilePreview {
    /// 剩余题目的提示文字
    pub fn more_hint(&self) -> Option<String> {
        (self.remaining > 0).then(|| format!("... 以及另外 {} 道题目", self.remaining))
    }
}

/// 将文本按行拆分为题目（trim 后去掉空行，保持原顺序）
pub fn split_questions(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// 读取 .txt 题目文件
pub async fn load_questions_file(path: &Path) -> AppResult<QuestionFile> {
    let file_name = file_name_of(path)?;

    if !has_extension(path, &["txt"]) {
        return Err(AppError::validation(format!(
            "请上传 .txt 文件: {}",
            file_name
        )));
    }

    let bytes = fs::read(path)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))?;

    let content = String::from_utf8_lossy(&bytes);
    let questions = split_questions(&content);

    if questions.is_empty() {
        return Err(AppError::validation(format!(
            "文件中没有找到题目: {}",
            file_name
        )));
    }

    tracing::info!("成功加载 {} 道题目 ({})", questions.len(), file_name);

    Ok(QuestionFile {
        file_name,
        bytes,
        questions,
    })
}

/// 读取题目图片，返回 (内容, 文件名)
pub async fn load_image(path: &Path) -> AppResult<(Vec<u8>, String)> {
    let file_name = file_name_of(path)?;

    if !has_extension(path, &IMAGE_EXTENSIONS) {
        return Err(AppError::validation(format!(
            "不支持的图片格式: {} (支持 {})",
            file_name,
            IMAGE_EXTENSIONS.join(" / ")
        )));
    }

    let bytes = fs::read(path)
        .await
        .map_err(|e| AppError::file(path.display().to_string(), e))?;

    Ok((bytes, file_name))
}

fn file_name_of(path: &Path) -> AppResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::validation(format!("无效的文件路径: {}", path.display())))
}

fn has_extension(path: &Path, allowed: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
