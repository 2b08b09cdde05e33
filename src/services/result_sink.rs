//! 结果汇总 - 业务能力层
//!
//! 当前结果集只会被整体替换，不做追加或合并

use crate::models::{QaResult, TokenUsage};
use std::sync::{Arc, RwLock};
use tracing::debug;

#[derive(Debug, Default)]
struct SinkInner {
    results: Arc<Vec<QaResult>>,
    /// 替换次数
    generation: u64,
}

/// 结果汇总
///
/// 可以 clone，多个持有者共享同一份结果集
#[derive(Debug, Clone, Default)]
pub struct ResultSink {
    inner: Arc<RwLock<SinkInner>>,
}

impl ResultSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 整体替换结果集
    pub fn replace(&self, results: Vec<QaResult>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        for (idx, result) in results.iter().enumerate() {
            if let Some(usage) = &result.token_usage {
                if !usage.is_consistent() {
                    debug!("第 {} 条结果的 token 统计不一致: {:?}", idx + 1, usage);
                }
            }
        }

        inner.results = Arc::new(results);
        inner.generation += 1;
        debug!(
            "结果集已替换 (第 {} 次)，共 {} 条",
            inner.generation,
            inner.results.len()
        );
    }

    /// 当前结果集快照
    pub fn snapshot(&self) -> Arc<Vec<QaResult>> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&inner.results)
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    /// 结果集非空时才允许导出
    pub fn can_export(&self) -> bool {
        !self.is_empty()
    }

    /// 结果集被替换的次数
    pub fn replace_count(&self) -> u64 {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.generation
    }

    /// 汇总所有结果的 token 用量
    pub fn total_usage(&self) -> TokenUsage {
        let mut total = TokenUsage::default();
        for usage in self.snapshot().iter().filter_map(|r| r.token_usage.as_ref()) {
            total.accumulate(usage);
        }
        total
    }
}
