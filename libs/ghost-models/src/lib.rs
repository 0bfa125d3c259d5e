//! Ghost API models
//!
//! Wire-level types shared by the Cloud Deploy client: list envelopes,
//! job payloads, job lifecycle values and the strategy vocabularies the
//! server accepts in job options.

pub mod models;

pub use models::*;
