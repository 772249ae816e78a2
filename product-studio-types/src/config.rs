use serde::{Deserialize, Serialize};

use crate::enums::Modality;

/// 生成配置。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<Modality>>,
}

impl GenerationConfig {
    /// 要求模型同时返回文本与图像（Gemini 原生图像输出的常用设置）。
    #[must_use]
    pub fn image_output() -> Self {
        Self {
            response_modalities: Some(vec![Modality::Text, Modality::Image]),
            ..Self::default()
        }
    }
}

/// 图像输出配置。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// 例如 `1:1`、`4:3`、`16:9`。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
}
