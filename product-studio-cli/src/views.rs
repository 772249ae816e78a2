//! Terminal rendering of the studio: banner, loading overlay, showcase and
//! error panel. Everything here returns strings so the command decides where
//! they go.

use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

use product_studio::studio::StudioEvent;
use product_studio::types::studio::{GenerationState, ProductImage};

/// Stepper stages with the progress at which each one lights up.
pub const STAGES: [(&str, u8); 4] = [
    ("Analysis", 0),
    ("Lighting", 30),
    ("Rendering", 60),
    ("Polishing", 90),
];

pub const TIP: &str = "Tip: Use high-contrast backgrounds for better edge detection.";

const RULE: &str = "------------------------------------------------------------";

pub fn banner() -> String {
    format!("{RULE}\n  PRODUCT STUDIO  |  AI marketing shots from one photo\n{RULE}")
}

pub fn stepper(progress: u8) -> String {
    STAGES
        .iter()
        .map(|(label, min)| {
            let mark = if progress >= *min { '#' } else { '.' };
            format!("[{mark} {label}]")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn progress_line(percent: u8, task: &str) -> String {
    let task = if task.is_empty() { "Studio engine active" } else { task };
    format!("{percent:>3}% {}  {task}", stepper(percent))
}

pub fn error_panel(message: &str) -> String {
    let mut panel = String::new();
    let _ = writeln!(panel, "{RULE}");
    let _ = writeln!(panel, "  Studio error");
    for line in message.lines() {
        let _ = writeln!(panel, "  {line}");
    }
    let _ = write!(panel, "{RULE}");
    panel
}

pub fn countdown_line(remaining: Duration) -> String {
    format!("Cooling down... resume available in {}s", remaining.as_secs() + 1)
}

pub fn rendered_line(image: &ProductImage) -> String {
    format!("  ready: {} ({})", image.angle, image.description)
}

pub fn showcase(saved: &[(ProductImage, PathBuf)]) -> String {
    let mut out = String::from("Showcase\n");
    for (image, path) in saved {
        let _ = writeln!(out, "  {}. {:<17} {}", image.id, image.angle, path.display());
    }
    out
}

/// Line to print for an event, if any.
pub fn render_event(event: &StudioEvent) -> Option<String> {
    match event {
        StudioEvent::Progress { percent, task } => Some(progress_line(*percent, task)),
        StudioEvent::Rendered(image) => Some(rendered_line(image)),
        StudioEvent::Failed { message } => Some(error_panel(message)),
        StudioEvent::CooldownStarted { remaining } => Some(format!(
            "Rate limit reached; cooling down for {}s.",
            remaining.as_secs()
        )),
        StudioEvent::State(GenerationState::Loading) => Some(TIP.to_string()),
        StudioEvent::State(_) => None,
    }
}
