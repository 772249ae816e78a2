use serde::{Deserialize, Serialize};

use crate::content::{Blob, Content};
use crate::enums::{BlockedReason, FinishReason};

/// 生成内容响应。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_feedback: Option<PromptFeedback>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_metadata: Option<UsageMetadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_id: Option<String>,
}

impl GenerateContentResponse {
    /// 提取第一个候选的文本。
    #[must_use]
    pub fn text(&self) -> Option<String> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.first_text())
            .map(ToString::to_string)
    }

    /// 提取第一个候选中的第一张内联图像。
    #[must_use]
    pub fn first_inline_image(&self) -> Option<&Blob> {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(Content::first_inline_data)
    }

    /// 若请求或候选被安全策略拦截，返回拦截原因描述。
    #[must_use]
    pub fn safety_block(&self) -> Option<String> {
        if let Some(feedback) = &self.prompt_feedback {
            if let Some(reason) = feedback.block_reason {
                return Some(
                    feedback
                        .block_reason_message
                        .clone()
                        .unwrap_or_else(|| format!("prompt blocked: {reason:?}")),
                );
            }
        }
        self.candidates.first().and_then(|candidate| {
            candidate
                .finish_reason
                .filter(|reason| reason.is_safety_block())
                .map(|reason| {
                    candidate
                        .finish_message
                        .clone()
                        .unwrap_or_else(|| format!("generation stopped: {reason:?}"))
                })
        })
    }
}

/// 响应候选。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<i32>,
}

/// Prompt 反馈。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason: Option<BlockedReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_reason_message: Option<String>,
}

/// 用量统计。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt_token_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidates_token_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_token_count: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_image_and_text_from_first_candidate() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "Rendered."},
                    {"inlineData": {"mimeType": "image/png", "data": "iVBO"}}
                ]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {"promptTokenCount": 1290, "totalTokenCount": 2580},
            "modelVersion": "gemini-2.5-flash-image"
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("Rendered."));
        assert_eq!(response.first_inline_image().unwrap().mime_type, "image/png");
        assert!(response.safety_block().is_none());
    }

    #[test]
    fn prompt_feedback_block_is_reported() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": {"blockReason": "PROHIBITED_CONTENT"}
        }))
        .unwrap();
        assert!(response.first_inline_image().is_none());
        let reason = response.safety_block().unwrap();
        assert!(reason.contains("ProhibitedContent"));
    }

    #[test]
    fn safety_finish_reason_prefers_finish_message() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "finishReason": "IMAGE_SAFETY",
                "finishMessage": "Unable to show the generated image."
            }]
        }))
        .unwrap();
        assert_eq!(
            response.safety_block().as_deref(),
            Some("Unable to show the generated image.")
        );
    }

    #[test]
    fn empty_response_parses() {
        let response: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert!(response.candidates.is_empty());
        assert!(response.first_inline_image().is_none());
        assert!(response.safety_block().is_none());
    }
}
