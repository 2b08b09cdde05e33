use serde::{Deserialize, Serialize};

/// 待提交的一道题目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionEntry {
    pub text: String,
}

impl QuestionEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Token 用量
///
/// `total_tokens == prompt_tokens + completion_tokens` 只做诊断，不强制
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl TokenUsage {
    /// 数值来自服务端，相加溢出也视为不一致
    pub fn is_consistent(&self) -> bool {
        self.prompt_tokens.checked_add(self.completion_tokens) == Some(self.total_tokens)
    }

    /// 累加另一份用量（饱和加法）
    pub fn accumulate(&mut self, other: &TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// 服务端返回的一条解答结果，客户端只整体替换，从不修改字段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaResult {
    pub question: String,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl QaResult {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            token_usage: None,
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_result_without_usage() {
        let result: QaResult = serde_json::from_value(json!({
            "question": "A?",
            "answer": "x"
        }))
        .unwrap();
        assert_eq!(result, QaResult::new("A?", "x"));

        // 序列化时不输出空的 token_usage
        let value = serde_json::to_value(&result).unwrap();
        assert!(value.get("token_usage").is_none());
    }

    #[test]
    fn test_usage_consistency_is_diagnostic_only() {
        let usage: TokenUsage = serde_json::from_value(json!({
            "prompt_tokens": 10,
            "completion_tokens": 5,
            "total_tokens": 20
        }))
        .unwrap();
        assert!(!usage.is_consistent());

        let mut total = TokenUsage::default();
        total.accumulate(&usage);
        total.accumulate(&usage);
        assert_eq!(total.total_tokens, 40);
    }

    #[test]
    fn test_huge_usage_does_not_overflow() {
        let usage = TokenUsage {
            prompt_tokens: u64::MAX,
            completion_tokens: 1,
            total_tokens: u64::MAX,
        };
        assert!(!usage.is_consistent());

        let mut total = TokenUsage::default();
        total.accumulate(&usage);
        total.accumulate(&usage);
        assert_eq!(total.prompt_tokens, u64::MAX);
        assert_eq!(total.completion_tokens, 2);
        assert_eq!(total.total_tokens, u64::MAX);
    }
}
