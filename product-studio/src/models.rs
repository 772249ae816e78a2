//! Models API surface (`generateContent`).

use std::sync::Arc;

use product_studio_types::content::Content;
use product_studio_types::models::{GenerateContentConfig, GenerateContentRequest};
use product_studio_types::response::GenerateContentResponse;
use serde_json::Value;
use tracing::warn;

use crate::client::ClientInner;
use crate::error::Result;

mod http;

use self::http::{build_model_method_url, classify_error_response};

#[derive(Clone)]
pub struct Models {
    pub(crate) inner: Arc<ClientInner>,
}

impl Models {
    pub(crate) fn new(inner: Arc<ClientInner>) -> Self {
        Self { inner }
    }

    /// 生成内容（默认配置）。
    ///
    /// # Errors
    /// 网络失败、非 2xx 响应或响应无法解析时返回错误。
    pub async fn generate_content(
        &self,
        model: impl Into<String>,
        contents: Vec<Content>,
    ) -> Result<GenerateContentResponse> {
        self.generate_content_with_config(model, contents, GenerateContentConfig::default())
            .await
    }

    /// 生成内容（自定义配置）。
    ///
    /// 429 映射为 `Error::RateLimited`，鉴权失败映射为 `Error::Auth`，
    /// 其他非 2xx 响应以原始响应体透传为 `Error::ApiError`。本方法不做重试。
    ///
    /// # Errors
    /// 网络失败、非 2xx 响应或响应无法解析时返回错误。
    pub async fn generate_content_with_config(
        &self,
        model: impl Into<String>,
        contents: Vec<Content>,
        config: GenerateContentConfig,
    ) -> Result<GenerateContentResponse> {
        let model = model.into();
        let request = GenerateContentRequest::new(contents, config);
        let url = build_model_method_url(&self.inner, &model, "generateContent");

        let request = self.inner.http.post(url).json(&request);
        let response = self.inner.send(request).await?;
        let status = response.status();
        if !status.is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error_response(status, &headers, body));
        }

        let value = response.json::<Value>().await?;
        serde_json::from_value(value.clone()).map_err(|err| {
            warn!(error = %err, raw = %value, "generateContent response parse failed");
            err.into()
        })
    }
}
