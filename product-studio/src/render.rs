//! The external generation call: one source image + one angle -> one image.

use futures_util::future::BoxFuture;
use product_studio_types::config::GenerationConfig;
use product_studio_types::content::{Content, Part, Role};
use product_studio_types::data_uri::DataUri;
use product_studio_types::models::GenerateContentConfig;
use product_studio_types::studio::Angle;
use tracing::{debug, warn};

use crate::client::Client;
use crate::error::{Error, Result};
use crate::prompt::compose_instruction;
use crate::source::SourceImage;

/// 默认图像模型。
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";

/// 渲染接口：成功时返回 `data:<mime>;base64,...`。
///
/// 实现方不做重试；限流必须以 `Error::RateLimited` 报告，编排器据此进入冷却。
pub trait ImageRenderer: Send + Sync {
    fn render<'a>(
        &'a self,
        source: &'a SourceImage,
        angle: &'a Angle,
        style: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>>;
}

/// 基于 Gemini `generateContent` 的渲染器。
#[derive(Clone)]
pub struct GeminiRenderer {
    client: Client,
    model: String,
    aspect_ratio: Option<String>,
}

impl GeminiRenderer {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            model: DEFAULT_MODEL.to_string(),
            aspect_ratio: None,
        }
    }

    /// 指定模型。
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// 指定输出宽高比，例如 `4:3`。
    #[must_use]
    pub fn with_aspect_ratio(mut self, ratio: impl Into<String>) -> Self {
        self.aspect_ratio = Some(ratio.into());
        self
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// 渲染单个角度。
    ///
    /// # Errors
    /// 限流、鉴权失败、安全拦截、响应中没有图像或其他服务端错误时返回错误。
    pub async fn render_angle(
        &self,
        source: &SourceImage,
        angle: &Angle,
        style: Option<&str>,
    ) -> Result<String> {
        let instruction = compose_instruction(angle, style);
        let contents = vec![Content::from_parts(
            vec![
                Part::inline_data(source.data().to_vec(), source.mime_type()),
                Part::text(instruction),
            ],
            Role::User,
        )];

        let mut generation_config = GenerationConfig::image_output();
        if let Some(ratio) = &self.aspect_ratio {
            generation_config.image_config = Some(product_studio_types::config::ImageConfig {
                aspect_ratio: Some(ratio.clone()),
            });
        }
        let config = GenerateContentConfig {
            generation_config: Some(generation_config),
            ..Default::default()
        };

        debug!(model = %self.model, angle = angle.label, "requesting angle");
        let response = self
            .client
            .models()
            .generate_content_with_config(&self.model, contents, config)
            .await?;

        if let Some(reason) = response.safety_block() {
            warn!(angle = angle.label, %reason, "generation blocked by safety filter");
            return Err(Error::SafetyBlocked { reason });
        }

        let image = response.first_inline_image().ok_or_else(|| {
            warn!(
                angle = angle.label,
                text = %response.text().unwrap_or_default(),
                "response carried no inline image"
            );
            Error::EmptyResponse
        })?;
        Ok(DataUri::encode(&image.mime_type, &image.data))
    }
}

impl ImageRenderer for GeminiRenderer {
    fn render<'a>(
        &'a self,
        source: &'a SourceImage,
        angle: &'a Angle,
        style: Option<&'a str>,
    ) -> BoxFuture<'a, Result<String>> {
        Box::pin(self.render_angle(source, angle, style))
    }
}
