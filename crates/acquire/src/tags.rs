use crate::artwork::{Artwork, ImageKind};
use crate::error::{ErrorKind, Result};
use cassette_model::AnnotatedProperties;
use exn::{OptionExt, ResultExt};
use lofty::config::WriteOptions;
use lofty::file::{AudioFile, TaggedFileExt};
use lofty::picture::{MimeType, Picture, PictureType};
use lofty::prelude::Accessor;
use lofty::read_from_path;
use lofty::tag::Tag;
use std::path::Path;

/// Writes tags into a finished audio file.
///
/// Blocking; callers run it on the blocking thread pool.
pub trait TagWriter: Send + Sync {
    fn write(&self, path: &Path, properties: &AnnotatedProperties, artwork: Option<&Artwork>) -> Result<()>;
}

/// [`TagWriter`] using `lofty`: ID3v2 for MP3, iTunes atoms for M4A.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoftyTags;

impl TagWriter for LoftyTags {
    fn write(&self, path: &Path, properties: &AnnotatedProperties, artwork: Option<&Artwork>) -> Result<()> {
        let mut tagged_file = read_from_path(path).or_raise(|| ErrorKind::Tag)?;
        let tag_type = tagged_file.primary_tag_type();
        if tagged_file.tag(tag_type).is_none() {
            tagged_file.insert_tag(Tag::new(tag_type));
        }
        let tag = tagged_file.tag_mut(tag_type).ok_or_raise(|| ErrorKind::Tag)?;

        tag.set_title(properties.song.clone());
        tag.set_album(properties.album.clone());
        tag.set_artist(properties.artist.clone());
        tag.set_genre(properties.genre.clone());
        if let Some(artwork) = artwork {
            tag.remove_picture_type(PictureType::CoverFront);
            tag.push_picture(
                Picture::unchecked(artwork.bytes.clone())
                    .pic_type(PictureType::CoverFront)
                    .mime_type(mime_type(artwork.kind))
                    .build(),
            );
        }

        tagged_file.save_to_path(path, WriteOptions::default()).or_raise(|| ErrorKind::Tag)?;
        Ok(())
    }
}

fn mime_type(kind: ImageKind) -> MimeType {
    match kind {
        ImageKind::Jpeg => MimeType::Jpeg,
        ImageKind::Png => MimeType::Png,
        ImageKind::Gif => MimeType::Gif,
        ImageKind::Webp => MimeType::Unknown(kind.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreadable_file_is_a_tag_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("song.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();
        let err = LoftyTags.write(&path, &AnnotatedProperties::defaults("song"), None).unwrap_err();
        assert_eq!(*err, ErrorKind::Tag);
    }
}
