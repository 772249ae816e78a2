//! Studio domain types: camera angles, style presets, generated results.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data_uri::{extension_from_mime, DataUri, ParseDataUriError};

/// 一个固定的拍摄角度预设。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Angle {
    /// 角度标识（1..=3）。
    pub id: u8,
    pub label: &'static str,
    /// 发送给模型的角度指令。
    pub instruction: &'static str,
}

/// 每次生成依次请求的三个角度。
pub const ANGLES: [Angle; 3] = [
    Angle {
        id: 1,
        label: "Frontal Master",
        instruction: "Perfect centered frontal view, professional lighting.",
    },
    Angle {
        id: 2,
        label: "Hero Perspective",
        instruction: "Three-quarter dynamic view, premium depth.",
    },
    Angle {
        id: 3,
        label: "Detail View",
        instruction: "Close-up texture focus or side-profile view.",
    },
];

/// 会话状态：同一时刻只有一个值有效。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationState {
    #[default]
    Idle,
    Loading,
    Success,
    Error,
}

impl GenerationState {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::Loading)
    }
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Error => "error",
        };
        f.write_str(name)
    }
}

/// 一张生成结果。创建后不再修改，会话重置时丢弃。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub id: u8,
    /// `data:<mime>;base64,...` 形式的图像。
    pub url: String,
    /// 角度标签。
    pub angle: String,
    pub description: String,
}

impl ProductImage {
    /// 由角度与模型返回的 data URI 创建结果记录。
    pub fn new(angle: &Angle, url: impl Into<String>) -> Self {
        Self {
            id: angle.id,
            url: url.into(),
            angle: angle.label.to_string(),
            description: format!("Generated {}", angle.label),
        }
    }

    /// 解码图像数据。
    ///
    /// # Errors
    /// 当 `url` 不是合法的 base64 data URI 时返回错误。
    pub fn decode(&self) -> Result<DataUri, ParseDataUriError> {
        self.url.parse()
    }

    /// 根据 data URI 的 MIME 推断文件扩展名。
    #[must_use]
    pub fn extension(&self) -> &'static str {
        let mime = self
            .url
            .strip_prefix("data:")
            .and_then(|rest| rest.split([';', ',']).next())
            .unwrap_or_default();
        extension_from_mime(&mime.to_ascii_lowercase())
    }

    /// 保存用的文件名，例如 `1-frontal-master.png`。
    #[must_use]
    pub fn file_name(&self) -> String {
        let slug = self
            .angle
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        format!("{}-{slug}.{}", self.id, self.extension())
    }
}

/// 背景/光线风格预设，展开为风格提示词。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StylePreset {
    Studio,
    Loft,
    Outdoor,
    Marble,
    Lifestyle,
}

impl StylePreset {
    pub const ALL: [Self; 5] = [
        Self::Studio,
        Self::Loft,
        Self::Outdoor,
        Self::Marble,
        Self::Lifestyle,
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Studio => "studio",
            Self::Loft => "loft",
            Self::Outdoor => "outdoor",
            Self::Marble => "marble",
            Self::Lifestyle => "lifestyle",
        }
    }

    /// 预设对应的风格提示词。
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::Studio => "Seamless white studio backdrop, soft diffused key light, gentle floor shadow.",
            Self::Loft => "Minimalist concrete loft, large window light, muted neutral tones.",
            Self::Outdoor => "Outdoors in soft late-afternoon sun, shallow depth of field, natural greenery.",
            Self::Marble => "Polished white marble surface, bright morning light, subtle reflections.",
            Self::Lifestyle => "Cozy home interior, wooden table, warm ambient light, lived-in props kept out of focus.",
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StylePreset {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim();
        Self::ALL
            .into_iter()
            .find(|preset| preset.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|preset| preset.name()).collect();
                format!("unknown style preset `{wanted}` (expected one of: {})", names.join(", "))
            })
    }
}
