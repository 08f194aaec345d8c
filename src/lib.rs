//! Turn a playlist into a folder of tagged audio files.
//!
//! [`BatchOrchestrator`] drives the pipeline (resolve, annotate, acquire)
//! over the external collaborators bundled in [`Services`].

pub mod batch;
mod services;

pub use crate::batch::{AnnotationStatus, BatchEvent, BatchOrchestrator, BatchResult, Observer, Prepared};
pub use crate::services::Services;
