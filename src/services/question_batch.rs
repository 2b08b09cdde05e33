//! 题目批次构建 - 业务能力层
//!
//! 只负责在提交前累积题目，不做任何网络请求

use crate::error::{AppError, AppResult};
use crate::models::loaders::split_questions;
use crate::models::QuestionEntry;
use tracing::debug;

/// 题目批次
///
/// 插入顺序即提交顺序，不去重
#[derive(Debug, Clone, Default)]
pub struct QuestionBatch {
    entries: Vec<QuestionEntry>,
}

impl QuestionBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加一道题目
    pub fn add_one(&mut self, text: &str) -> AppResult<()> {
        let question = text.trim();
        if question.is_empty() {
            return Err(AppError::validation("请输入题目"));
        }
        self.entries.push(QuestionEntry::new(question));
        Ok(())
    }

    /// 批量添加（每行一题），返回实际添加的数量
    pub fn add_bulk(&mut self, raw_block: &str) -> AppResult<usize> {
        if raw_block.trim().is_empty() {
            return Err(AppError::validation("请输入至少一道题目"));
        }

        let questions = split_questions(raw_block);
        let added = questions.len();
        self.entries
            .extend(questions.into_iter().map(QuestionEntry::new));

        debug!("批量添加 {} 道题目，当前共 {} 道", added, self.entries.len());
        Ok(added)
    }

    /// 删除指定位置的题目
    pub fn remove(&mut self, index: usize) -> AppResult<QuestionEntry> {
        if index >= self.entries.len() {
            return Err(AppError::Index {
                index,
                len: self.entries.len(),
            });
        }
        Ok(self.entries.remove(index))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> &[QuestionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
