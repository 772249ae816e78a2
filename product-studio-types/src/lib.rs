//! Shared wire and domain types for Product Studio.

mod base64_serde;

pub mod config;
pub mod content;
pub mod data_uri;
pub mod enums;
pub mod models;
pub mod response;
pub mod studio;
