//! The data that flows through a batch.
//!
//! - [`ItemDescriptor`]: one resolved playlist entry. Its `title` is the key
//!   for everything else in the batch.
//! - [`AnnotatedProperties`]: what ends up in the tags (and the filename) of
//!   the produced file.
//! - [`Playlist`]: the ordered, title-keyed pairing of the two, editable by
//!   whatever front-end sits on top.

pub mod error;
mod format;
mod item;
mod playlist;
mod properties;
mod sanitize;

pub use crate::format::Format;
pub use crate::item::{ItemDescriptor, mmss};
pub use crate::playlist::{Entry, Playlist};
pub use crate::properties::{AnnotatedProperties, Field, UNKNOWN};
pub use crate::sanitize::{ILLEGAL_CHARACTERS, sanitize};
