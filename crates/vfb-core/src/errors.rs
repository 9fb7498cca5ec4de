use std::path::PathBuf;

use crate::media::CandidateError;

/// Core error type for the bot.
///
/// Adapter crates map their specific errors into this type so the pipeline
/// can log failures consistently without knowing which adapter produced them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error(transparent)]
    Candidate(#[from] CandidateError),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
