//! Media acquisition and validation pipeline.
//!
//! A [`MediaCandidate`] is created per URL by [`MediaFetcher::candidate`],
//! which resolves metadata and runs admission eagerly. Callers then
//! `download()`, consume `local_path()`, and `delete()`.

mod candidate;
mod metadata;
mod policy;
mod response;
mod workspace;

pub use candidate::{CandidateError, CandidateStatus, MediaCandidate, MediaFetcher};
pub use metadata::{MediaMetadata, SizeEstimate};
pub use policy::{admit, InvalidReason, Limits};
pub use response::Response;
pub use workspace::RequestKey;
