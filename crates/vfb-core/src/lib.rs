//! Core domain + application logic for the video fetch bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and `yt-dlp` live
//! behind ports (traits) implemented in adapter crates.

pub mod backend;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod media;
pub mod messaging;
pub mod utils;

pub use errors::{Error, Result};
