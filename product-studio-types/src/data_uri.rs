//! `data:<mime>;base64,<payload>` 编码的图像。

use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// 解码后的 data URI。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// data URI 解析失败。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDataUriError {
    message: String,
}

impl ParseDataUriError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ParseDataUriError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid data URI: {}", self.message)
    }
}

impl std::error::Error for ParseDataUriError {}

impl DataUri {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data,
        }
    }

    /// 编码为 `data:<mime>;base64,<payload>`。
    #[must_use]
    pub fn encode(mime_type: &str, data: &[u8]) -> String {
        format!("data:{mime_type};base64,{}", STANDARD.encode(data))
    }
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&Self::encode(&self.mime_type, &self.data))
    }
}

impl FromStr for DataUri {
    type Err = ParseDataUriError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let rest = value
            .trim()
            .strip_prefix("data:")
            .ok_or_else(|| ParseDataUriError::new("missing `data:` prefix"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| ParseDataUriError::new("missing `,` separator"))?;

        let mut params = header.split(';');
        let mime_type = params.next().unwrap_or_default().trim();
        if !params.any(|param| param.trim().eq_ignore_ascii_case("base64")) {
            return Err(ParseDataUriError::new("only base64 payloads are supported"));
        }
        // RFC 2397: 缺省媒体类型为 text/plain。
        let mime_type = if mime_type.is_empty() {
            "text/plain"
        } else {
            mime_type
        };

        let data = STANDARD
            .decode(payload.trim().as_bytes())
            .map_err(|err| ParseDataUriError::new(err.to_string()))?;
        Ok(Self::new(data, mime_type.to_ascii_lowercase()))
    }
}

/// 常见图像 MIME 对应的文件扩展名。
#[must_use]
pub fn extension_from_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        "image/heic" => "heic",
        "image/heif" => "heif",
        "image/bmp" => "bmp",
        "image/tiff" => "tiff",
        _ => "bin",
    }
}
