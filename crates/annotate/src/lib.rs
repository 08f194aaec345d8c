//! Metadata annotation.
//!
//! An [`Annotator`] looks every item of a batch up with a
//! [`MetadataProvider`] (production: [`ITunes`]) and turns the first match into
//! the [`AnnotatedProperties`](cassette_model::AnnotatedProperties) the file
//! will be tagged with. A [`TitleLookup`] (production: [`OEmbed`]) supplies a
//! search term for references that carry no title of their own.

mod annotator;
mod consts;
pub mod error;
mod itunes;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod oembed;

pub use crate::annotator::{Annotation, Annotations, Annotator};
use crate::error::Result;
pub use crate::itunes::{ITunes, upscale_artwork};
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::{MockProvider, MockTitles};
pub use crate::oembed::OEmbed;
use async_trait::async_trait;
use cassette_model::AnnotatedProperties;
use std::sync::Arc;

pub type ProviderHandle = Arc<dyn MetadataProvider + Send + Sync>;
pub type TitleLookupHandle = Arc<dyn TitleLookup + Send + Sync>;

/// The provider's best match for a search term, already normalised.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    pub name: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    /// Highest resolution variant the provider offers.
    pub artwork_url: Option<String>,
    /// Rounded to two decimal places.
    pub length_minutes: Option<f64>,
}

impl Track {
    /// Tag values for this match. Missing fields become
    /// [`UNKNOWN`](cassette_model::UNKNOWN), a missing track name falls back
    /// to `title`.
    pub fn to_properties(&self, title: &str) -> AnnotatedProperties {
        use cassette_model::Field;
        let mut properties = AnnotatedProperties::defaults(title);
        let fields = [
            (Field::Song, &self.name),
            (Field::Album, &self.album),
            (Field::Artist, &self.artist),
            (Field::Genre, &self.genre),
            (Field::Artwork, &self.artwork_url),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                properties.set(field, value.as_str());
            }
        }
        properties
    }
}

/// A searchable catalogue of music metadata.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// The first match for `term`, in the provider's own ranking.
    async fn search(&self, term: &str) -> Result<Option<Track>>;
}

/// Resolves the display title of a canonical item URL.
#[async_trait]
pub trait TitleLookup: Send + Sync {
    async fn title(&self, url: &str) -> Result<Option<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cassette_model::UNKNOWN;

    #[test]
    fn test_partial_track_keeps_defaults() {
        let track = Track {
            name: None,
            artist: Some("Yuna Ito".into()),
            genre: Some("  ".into()),
            ..Track::default()
        };
        let properties = track.to_properties("Stuck on you");
        assert_eq!(properties.song, "Stuck on you");
        assert_eq!(properties.artist, "Yuna Ito");
        assert_eq!(properties.genre, UNKNOWN);
        assert_eq!(properties.album, UNKNOWN);
        assert!(!properties.has_artwork());
    }
}
