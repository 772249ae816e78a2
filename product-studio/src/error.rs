//! Error definitions for the studio.

use std::time::Duration;

use thiserror::Error;

/// 生成失败时的通用提示。
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An unexpected error occurred. Please check your connection.";

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP client error: {source}")]
    HttpClient {
        #[from]
        source: reqwest::Error,
    },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("Blocked by content safety filter: {reason}")]
    SafetyBlocked { reason: String },

    #[error("Response contained no image")]
    EmptyResponse,

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Auth error: {message}")]
    Auth { message: String },

    #[error("No source image loaded")]
    MissingSource,

    #[error("Source image is {size} bytes, limit is {limit} bytes")]
    SourceTooLarge { size: u64, limit: u64 },

    #[error("Unsupported media type: {mime_type}")]
    UnsupportedMedia { mime_type: String },

    #[error("{source}")]
    InvalidDataUri {
        #[from]
        source: product_studio_types::data_uri::ParseDataUriError,
    },

    #[error("Cooling down, {remaining:?} remaining")]
    CoolingDown { remaining: Duration },

    #[error("Nothing to resume")]
    NothingToResume,

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// 面向用户的提示文本。
    ///
    /// 安全拦截、限流等有专门措辞；其余服务端错误原样透传。
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::RateLimited { retry_after, .. } => match retry_after {
                Some(wait) => format!(
                    "The image service is busy (rate limit reached). Please wait {}s before resuming.",
                    wait.as_secs().max(1)
                ),
                None => "The image service is busy (rate limit reached). Please wait for the cooldown before resuming.".into(),
            },
            Self::SafetyBlocked { .. } => "The request was blocked by the content safety filter. Try a different product photo or style prompt.".into(),
            Self::EmptyResponse => "The image service returned no image. Please try again.".into(),
            Self::InvalidConfig { message } | Self::Auth { message } => {
                format!("API key missing or invalid: {message}")
            }
            Self::MissingSource => "Upload a product image first.".into(),
            Self::SourceTooLarge { limit, .. } => {
                format!("Image exceeds {}MB limit.", limit / (1024 * 1024))
            }
            Self::UnsupportedMedia { mime_type } => {
                format!("Unsupported file type `{mime_type}`; please choose an image.")
            }
            Self::CoolingDown { remaining } => format!(
                "Still cooling down, try again in {}s.",
                remaining.as_secs().max(1)
            ),
            Self::NothingToResume => "There is no interrupted session to resume.".into(),
            Self::ApiError { message, .. } if !message.trim().is_empty() => message.clone(),
            Self::ApiError { .. } | Self::Serialization { .. } => GENERIC_FAILURE_MESSAGE.into(),
            other => other.to_string(),
        }
    }

    /// 是否为可在冷却后续跑的限流错误。
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
