//! Source image intake: bytes, data URIs and files, with the upload limit.

use std::path::Path;

use product_studio_types::data_uri::DataUri;
use tracing::debug;

use crate::error::{Error, Result};

/// 上传图像的大小上限（15 MiB，恰好等于上限时允许）。
pub const MAX_SOURCE_BYTES: u64 = 15 * 1024 * 1024;

/// 当前会话的源图像。新上传会整体替换旧图。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    data: Vec<u8>,
    mime_type: String,
}

impl SourceImage {
    /// 从内存字节创建，使用默认大小上限。
    ///
    /// # Errors
    /// 数据为空、超过上限或 MIME 不是 `image/*` 时返回错误。
    pub fn from_bytes(data: Vec<u8>, mime_type: impl Into<String>) -> Result<Self> {
        Self::from_bytes_with_limit(data, mime_type, MAX_SOURCE_BYTES)
    }

    /// 从内存字节创建，使用自定义大小上限。
    ///
    /// # Errors
    /// 数据为空、超过上限或 MIME 不是 `image/*` 时返回错误。
    pub fn from_bytes_with_limit(
        data: Vec<u8>,
        mime_type: impl Into<String>,
        limit: u64,
    ) -> Result<Self> {
        let mime_type = mime_type.into().trim().to_ascii_lowercase();
        check_size(data.len() as u64, limit)?;
        if data.is_empty() {
            return Err(Error::UnsupportedMedia {
                mime_type: "empty file".into(),
            });
        }
        if !mime_type.starts_with("image/") {
            return Err(Error::UnsupportedMedia { mime_type });
        }
        Ok(Self { data, mime_type })
    }

    /// 从 `data:image/...;base64,...` 创建。
    ///
    /// # Errors
    /// data URI 非法，或解码结果不满足 [`SourceImage::from_bytes`] 的约束时返回错误。
    pub fn from_data_uri(uri: &str) -> Result<Self> {
        let DataUri { mime_type, data } = uri.parse()?;
        Self::from_bytes(data, mime_type)
    }

    /// 读取文件，MIME 由扩展名推断。
    ///
    /// 大小检查先于读取，超限文件不会被载入内存。
    ///
    /// # Errors
    /// 文件不可读、超过上限或不是图像时返回错误。
    pub async fn from_path(path: impl AsRef<Path>, limit: u64) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await?;
        check_size(metadata.len(), limit)?;

        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or("application/octet-stream");
        let data = tokio::fs::read(path).await?;
        debug!(path = %path.display(), bytes = data.len(), mime_type, "loaded source image");
        Self::from_bytes_with_limit(data, mime_type, limit)
    }

    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// 编码为 data URI（预览与回显用）。
    #[must_use]
    pub fn to_data_uri(&self) -> String {
        DataUri::encode(&self.mime_type, &self.data)
    }
}

fn check_size(size: u64, limit: u64) -> Result<()> {
    if size > limit {
        return Err(Error::SourceTooLarge { size, limit });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn exactly_at_limit_is_accepted() {
        let image = SourceImage::from_bytes_with_limit(vec![0u8; 16], "image/png", 16).unwrap();
        assert_eq!(image.len(), 16);
    }

    #[test]
    fn one_byte_over_limit_is_rejected() {
        let err = SourceImage::from_bytes_with_limit(vec![0u8; 17], "image/png", 16).unwrap_err();
        assert!(matches!(err, Error::SourceTooLarge { size: 17, limit: 16 }));
    }

    #[test]
    fn default_limit_boundary() {
        let limit = usize::try_from(MAX_SOURCE_BYTES).unwrap();
        assert!(SourceImage::from_bytes(vec![0u8; limit], "image/jpeg").is_ok());
        assert!(matches!(
            SourceImage::from_bytes(vec![0u8; limit + 1], "image/jpeg"),
            Err(Error::SourceTooLarge { .. })
        ));
    }

    #[test]
    fn non_images_and_empty_files_are_rejected() {
        let err = SourceImage::from_bytes(b"%PDF".to_vec(), "application/pdf").unwrap_err();
        assert!(matches!(err, Error::UnsupportedMedia { .. }));
        let err = SourceImage::from_bytes(Vec::new(), "image/png").unwrap_err();
        assert!(matches!(err, Error::UnsupportedMedia { .. }));
    }

    #[test]
    fn data_uri_round_trip_keeps_mime() {
        let image = SourceImage::from_data_uri("data:image/webp;base64,AQID").unwrap();
        assert_eq!(image.mime_type(), "image/webp");
        assert_eq!(image.data(), &[1, 2, 3]);
        assert_eq!(image.to_data_uri(), "data:image/webp;base64,AQID");

        let err = SourceImage::from_data_uri("not-a-uri").unwrap_err();
        assert!(matches!(err, Error::InvalidDataUri { .. }));
    }

    #[tokio::test]
    async fn from_path_guesses_mime_and_checks_size_first() {
        let mut file = tempfile::Builder::new().suffix(".jpg").tempfile().unwrap();
        file.write_all(&[0xff, 0xd8, 0xff, 0xe0]).unwrap();

        let image = SourceImage::from_path(file.path(), 4).await.unwrap();
        assert_eq!(image.mime_type(), "image/jpeg");
        assert_eq!(image.len(), 4);

        let err = SourceImage::from_path(file.path(), 3).await.unwrap_err();
        assert!(matches!(err, Error::SourceTooLarge { size: 4, limit: 3 }));
    }

    #[tokio::test]
    async fn from_path_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SourceImage::from_path(dir.path().join("missing.png"), MAX_SOURCE_BYTES)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
