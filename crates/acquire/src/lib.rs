//! Per-item acquisition.
//!
//! [`AcquisitionWorker::acquire`] takes one [`Job`] from raw stream to tagged
//! file: download into the batch's scratch directory, transcode when the
//! target format needs it, fetch cover art, write tags, and finally move the
//! file into the destination directory. The external pieces sit behind
//! traits: [`Transcoder`] ([`Ffmpeg`]), [`ArtworkSource`] ([`HttpArtwork`])
//! and [`TagWriter`] ([`LoftyTags`]).

mod artwork;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod stage;
mod tags;
mod transcode;
mod worker;

pub use crate::artwork::{Artwork, ArtworkSource, HttpArtwork, ImageKind};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::{MockArtwork, MockTags, MockTranscoder, TagWrite};
pub use crate::stage::Stage;
pub use crate::tags::{LoftyTags, TagWriter};
pub use crate::transcode::{Ffmpeg, Transcoder};
pub use crate::worker::{AcquisitionWorker, ArtworkHandle, Job, TagWriterHandle, TranscoderHandle};
