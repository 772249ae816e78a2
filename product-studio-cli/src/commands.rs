//! Subcommand implementations.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context as _;
use clap::Args;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, BufReader};
use tracing::{info, warn};

use product_studio::types::studio::{ProductImage, StylePreset, ANGLES};
use product_studio::{
    Client, GeminiRenderer, ImageRenderer, SourceImage, Studio, StudioConfig, DEFAULT_MODEL,
    MAX_SOURCE_BYTES,
};

use crate::views;

const TTY_PATH: &str = "/dev/tty";

/// Generate the three angle shots.
///
/// Angles are rendered one at a time with a pause in between. When the API
/// rate limit is hit the finished shots are kept, a cooldown is shown and the
/// session continues after you press Enter. With `-` the Enter is read from
/// the terminal, since stdin carries the image.
#[derive(Args)]
pub struct GenerateCommand {
    /// Product photo to use, or `-` to read the image from stdin
    pub image: String,

    /// MIME type of an image read from stdin
    #[arg(long, default_value = "image/jpeg")]
    pub mime: String,

    /// Free-text backdrop / lighting description
    #[arg(short = 's', long, conflicts_with = "preset")]
    pub style: Option<String>,

    /// Built-in style preset (see `product-studio presets`)
    #[arg(short = 'p', long)]
    pub preset: Option<StylePreset>,

    /// Directory the generated images are written to
    #[arg(short = 'o', long, default_value = "studio-output")]
    pub out: PathBuf,

    /// Image model
    #[arg(long, env = "PRODUCT_STUDIO_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Output aspect ratio, e.g. 1:1 or 4:3
    #[arg(long)]
    pub aspect_ratio: Option<String>,

    /// Pause between two angle requests, in milliseconds
    #[arg(long, default_value_t = 2500)]
    pub delay_ms: u64,

    /// Cooldown after a rate limit when the server gives no hint, in seconds
    #[arg(long, default_value_t = 30)]
    pub cooldown_secs: u64,
}

impl GenerateCommand {
    fn studio_config(&self) -> StudioConfig {
        StudioConfig {
            angle_delay: Duration::from_millis(self.delay_ms),
            cooldown: Duration::from_secs(self.cooldown_secs),
            max_source_bytes: MAX_SOURCE_BYTES,
        }
    }

    /// Returns `ExitCode::FAILURE` when the session reported an error; the
    /// error panel has already been printed in that case.
    pub async fn run(&self) -> anyhow::Result<ExitCode> {
        eprintln!("{}", views::banner());

        let client = Client::from_env().context("API key missing or invalid")?;
        let mut renderer = GeminiRenderer::new(client).with_model(&self.model);
        if let Some(ratio) = &self.aspect_ratio {
            renderer = renderer.with_aspect_ratio(ratio);
        }
        let mut studio = Studio::with_config(renderer, self.studio_config());

        let mut events = studio.subscribe();
        let printer = tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if let Some(line) = views::render_event(&event) {
                    eprintln!("{line}");
                }
            }
        });

        if let Err(err) = self.load_source(&mut studio).await? {
            warn!(image = %self.image, error = %err, "source rejected");
            drop(studio);
            let _ = printer.await;
            return Ok(ExitCode::FAILURE);
        }
        if let Some(preset) = self.preset {
            studio.apply_preset(preset);
        } else if let Some(style) = &self.style {
            studio.set_style_prompt(style.clone());
        }

        let mut prompt = self.resume_prompt().await;
        let outcome = drive(&mut studio, &mut prompt).await?;
        if let Err(err) = &outcome {
            warn!(results = studio.results().len(), error = %err, "session ended early");
        }
        let saved = save_results(studio.results(), &self.out).await?;
        drop(studio);
        let _ = printer.await;

        if !saved.is_empty() {
            println!("{}", views::showcase(&saved));
        }
        Ok(if outcome.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        })
    }

    /// Loads the source into the studio. The inner error has already been
    /// shown to the user.
    async fn load_source<R: ImageRenderer>(
        &self,
        studio: &mut Studio<R>,
    ) -> anyhow::Result<product_studio::Result<()>> {
        if self.image != "-" {
            return Ok(studio.load_source_path(&self.image).await);
        }

        let mut data = Vec::new();
        tokio::io::stdin()
            .read_to_end(&mut data)
            .await
            .context("failed to read image from stdin")?;
        match SourceImage::from_bytes(data, self.mime.as_str()) {
            Ok(source) => Ok(studio.load_source(source)),
            Err(err) => {
                eprintln!("{}", views::error_panel(&err.user_message()));
                Ok(Err(err))
            }
        }
    }

    /// Where the Enter that resumes a rate-limited session is read from.
    ///
    /// Stdin is consumed by the image when reading from `-`, so the
    /// controlling terminal is used instead. Without one the prompt is
    /// empty and the session resumes on its own once the cooldown ends.
    async fn resume_prompt(&self) -> Box<dyn AsyncBufRead + Send + Unpin> {
        if self.image != "-" {
            return Box::new(BufReader::new(tokio::io::stdin()));
        }
        match tokio::fs::File::open(TTY_PATH).await {
            Ok(tty) => Box::new(BufReader::new(tty)),
            Err(err) => {
                warn!(error = %err, "no controlling terminal, resuming automatically after cooldowns");
                Box::new(tokio::io::empty())
            }
        }
    }
}

/// Runs the session, waiting out rate-limit cooldowns and resuming on Enter.
///
/// The outer error is a failure of the prompt itself; the inner one is the
/// error that ended the session.
async fn drive<R, P>(
    studio: &mut Studio<R>,
    prompt: &mut P,
) -> anyhow::Result<product_studio::Result<()>>
where
    R: ImageRenderer,
    P: AsyncBufRead + Unpin,
{
    let mut outcome = studio.run().await;
    loop {
        match outcome {
            Ok(()) => return Ok(Ok(())),
            Err(_) if studio.is_resumable() => {
                while let Some(remaining) = studio.cooldown_remaining() {
                    eprint!("\r{}", views::countdown_line(remaining));
                    tokio::time::sleep(remaining.min(Duration::from_secs(1))).await;
                }
                eprintln!("\rCooldown finished. Press Enter to resume.");
                let mut line = String::new();
                let read = prompt
                    .read_line(&mut line)
                    .await
                    .context("failed to read resume prompt")?;
                if read == 0 {
                    info!("no input available, resuming automatically");
                }
                outcome = studio.resume().await;
            }
            Err(err) => return Ok(Err(err)),
        }
    }
}

async fn save_results(
    results: &[ProductImage],
    out: &Path,
) -> anyhow::Result<Vec<(ProductImage, PathBuf)>> {
    if results.is_empty() {
        return Ok(Vec::new());
    }
    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("failed to create {}", out.display()))?;

    let mut saved = Vec::with_capacity(results.len());
    for image in results {
        let decoded = image
            .decode()
            .with_context(|| format!("invalid image data for {}", image.angle))?;
        let path = out.join(image.file_name());
        tokio::fs::write(&path, &decoded.data)
            .await
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "saved");
        saved.push((image.clone(), path));
    }
    Ok(saved)
}

pub fn list_presets() {
    for preset in StylePreset::ALL {
        println!("{:<10} {}", preset.name(), preset.prompt());
    }
}

pub fn list_angles() {
    for angle in &ANGLES {
        println!("{}. {:<17} {}", angle.id, angle.label, angle.instruction);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use futures_util::future::BoxFuture;
    use product_studio::types::studio::{Angle, GenerationState};
    use product_studio::Error;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Plays back scripted outcomes, then succeeds.
    #[derive(Default)]
    struct ScriptedRenderer {
        script: Mutex<VecDeque<product_studio::Result<String>>>,
    }

    impl ScriptedRenderer {
        fn with_script(script: Vec<product_studio::Result<String>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
            }
        }
    }

    impl ImageRenderer for ScriptedRenderer {
        fn render<'a>(
            &'a self,
            _source: &'a SourceImage,
            _angle: &'a Angle,
            _style: Option<&'a str>,
        ) -> BoxFuture<'a, product_studio::Result<String>> {
            let next = self
                .script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok("data:image/png;base64,AQ==".into()));
            Box::pin(async move { next })
        }
    }

    fn rate_limited_once() -> Studio<ScriptedRenderer> {
        let renderer = ScriptedRenderer::with_script(vec![
            Ok("data:image/png;base64,AQ==".into()),
            Err(Error::RateLimited {
                message: "quota".into(),
                retry_after: None,
            }),
        ]);
        studio_with(renderer)
    }

    fn studio_with(renderer: ScriptedRenderer) -> Studio<ScriptedRenderer> {
        let config = StudioConfig {
            angle_delay: Duration::ZERO,
            cooldown: Duration::ZERO,
            max_source_bytes: MAX_SOURCE_BYTES,
        };
        let mut studio = Studio::with_config(renderer, config);
        studio
            .load_source(SourceImage::from_bytes(vec![1, 2, 3], "image/png").unwrap())
            .unwrap();
        studio
    }

    #[tokio::test]
    async fn enter_resumes_after_rate_limit() {
        let mut studio = rate_limited_once();
        let mut prompt: &[u8] = b"\n";

        let outcome = drive(&mut studio, &mut prompt).await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(studio.state(), GenerationState::Success);
        assert_eq!(studio.results().len(), 3);
        assert!(prompt.is_empty());
    }

    #[tokio::test]
    async fn closed_prompt_resumes_automatically() {
        let mut studio = rate_limited_once();
        let mut prompt = tokio::io::empty();

        let outcome = drive(&mut studio, &mut prompt).await.unwrap();
        assert!(outcome.is_ok());
        assert_eq!(studio.results().len(), 3);
    }

    #[tokio::test]
    async fn terminal_errors_are_returned_not_raised() {
        let mut studio = studio_with(ScriptedRenderer::with_script(vec![Err(
            Error::SafetyBlocked {
                reason: "IMAGE_SAFETY".into(),
            },
        )]));
        let mut prompt: &[u8] = b"\n";

        let outcome = drive(&mut studio, &mut prompt).await.unwrap();
        assert!(matches!(outcome, Err(Error::SafetyBlocked { .. })));
        assert_eq!(studio.state(), GenerationState::Error);
        assert!(studio.results().is_empty());
        assert_eq!(prompt, b"\n");
    }

    #[tokio::test]
    async fn rejected_source_is_reported_once() {
        let cmd = Harness::parse_from(["product-studio", "missing-product.png"]).generate;
        let mut studio = Studio::with_config(ScriptedRenderer::default(), cmd.studio_config());
        let mut events = studio.subscribe();

        let loaded = cmd.load_source(&mut studio).await.unwrap();
        assert!(matches!(loaded, Err(Error::Io { .. })));
        let failures = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|event| matches!(event, product_studio::StudioEvent::Failed { .. }))
            .count();
        assert_eq!(failures, 1);
        assert_eq!(studio.state(), GenerationState::Idle);
    }

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        generate: GenerateCommand,
    }

    #[test]
    fn defaults_match_session_pacing() {
        let cmd = Harness::parse_from(["product-studio", "shoe.jpg"]).generate;
        let config = cmd.studio_config();
        assert_eq!(config.angle_delay, Duration::from_millis(2500));
        assert_eq!(config.cooldown, Duration::from_secs(30));
        assert_eq!(config.max_source_bytes, MAX_SOURCE_BYTES);
        assert_eq!(cmd.out, PathBuf::from("studio-output"));
    }

    #[test]
    fn style_and_preset_are_exclusive() {
        let parsed = Harness::try_parse_from([
            "product-studio",
            "shoe.jpg",
            "--style",
            "sunset",
            "--preset",
            "loft",
        ]);
        assert!(parsed.is_err());

        let cmd = Harness::parse_from(["product-studio", "shoe.jpg", "--preset", "marble"]).generate;
        assert_eq!(cmd.preset, Some(StylePreset::Marble));
    }

    #[tokio::test]
    async fn results_are_written_with_angle_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("shots");
        let results = vec![
            ProductImage::new(&ANGLES[0], "data:image/png;base64,AQID"),
            ProductImage::new(&ANGLES[2], "data:image/jpeg;base64,BAU="),
        ];

        let saved = save_results(&results, &out).await.unwrap();
        assert_eq!(saved.len(), 2);
        assert_eq!(
            std::fs::read(out.join("1-frontal-master.png")).unwrap(),
            vec![1, 2, 3]
        );
        assert_eq!(
            std::fs::read(out.join("3-detail-view.jpg")).unwrap(),
            vec![4, 5]
        );
    }

    #[tokio::test]
    async fn nothing_to_save_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty");
        assert!(save_results(&[], &out).await.unwrap().is_empty());
        assert!(!out.exists());
    }
}
