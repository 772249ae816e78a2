//! Gemini-backed product photo studio.
//!
//! Upload one product photo, optionally describe a style, and get three
//! marketing shots back: a frontal master, a hero three-quarter view and a
//! detail close-up.

pub mod client;
pub mod error;
pub mod models;
pub mod prompt;
pub mod render;
pub mod source;
pub mod studio;

#[cfg(test)]
mod test_support;

pub use product_studio_types as types;

pub use client::{Client, ClientBuilder, HttpOptions};
pub use error::{Error, Result};
pub use render::{GeminiRenderer, ImageRenderer, DEFAULT_MODEL};
pub use source::{SourceImage, MAX_SOURCE_BYTES};
pub use studio::{Studio, StudioConfig, StudioEvent};
