use crate::error::{Error, ErrorKind};
use crate::sanitize::sanitize;
use std::str::FromStr;

/// Placeholder for any tag we know nothing about.
pub const UNKNOWN: &str = "Unknown";

/// Everything the tagging stage writes into a produced file.
///
/// Built either from a metadata match or from [`defaults`](Self::defaults).
/// None of the text fields is ever empty once constructed through either.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedProperties {
    pub song: String,
    pub album: String,
    pub artist: String,
    pub genre: String,
    /// URL of the cover art; empty when there is none.
    pub artwork: String,
}

impl AnnotatedProperties {
    /// What an item gets when annotation was skipped or found nothing: the
    /// original title as the song, [`UNKNOWN`] everywhere else.
    pub fn defaults(title: &str) -> Self {
        let song = if title.trim().is_empty() { UNKNOWN.to_string() } else { title.to_string() };
        Self {
            song,
            album: UNKNOWN.to_string(),
            artist: UNKNOWN.to_string(),
            genre: UNKNOWN.to_string(),
            artwork: String::new(),
        }
    }

    /// The song name as a filename stem. Falls back to [`UNKNOWN`] if nothing
    /// survives sanitizing.
    pub fn file_stem(&self) -> String {
        match sanitize(&self.song) {
            stem if stem.is_empty() => UNKNOWN.to_string(),
            stem => stem,
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Song => &self.song,
            Field::Album => &self.album,
            Field::Artist => &self.artist,
            Field::Genre => &self.genre,
            Field::Artwork => &self.artwork,
        }
    }

    /// Overwrites one field. Blank text fields fall back to [`UNKNOWN`] so a
    /// tag is never written empty; a blank artwork simply means "none".
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        let value = match field {
            Field::Artwork => value.trim().to_string(),
            _ if value.trim().is_empty() => UNKNOWN.to_string(),
            _ => value,
        };
        match field {
            Field::Song => self.song = value,
            Field::Album => self.album = value,
            Field::Artist => self.artist = value,
            Field::Genre => self.genre = value,
            Field::Artwork => self.artwork = value,
        }
    }

    pub fn has_artwork(&self) -> bool {
        !self.artwork.is_empty()
    }
}

/// Names one of the [`AnnotatedProperties`] columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    Song,
    Album,
    Artist,
    Genre,
    Artwork,
}

impl FromStr for Field {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "song" | "title" => Ok(Self::Song),
            "album" => Ok(Self::Album),
            "artist" => Ok(Self::Artist),
            "genre" => Ok(Self::Genre),
            "artwork" | "cover" => Ok(Self::Artwork),
            _ => exn::bail!(ErrorKind::UnknownField(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_never_empty() {
        let props = AnnotatedProperties::defaults("Yuna Ito - Stuck on you");
        assert_eq!(props.song, "Yuna Ito - Stuck on you");
        assert_eq!(props.album, UNKNOWN);
        assert_eq!(props.artist, UNKNOWN);
        assert_eq!(props.genre, UNKNOWN);
        assert!(!props.has_artwork());

        assert_eq!(AnnotatedProperties::defaults("   ").song, UNKNOWN);
    }

    #[test]
    fn test_file_stem_is_sanitized() {
        let props = AnnotatedProperties::defaults("AC/DC: Thunderstruck?");
        assert_eq!(props.file_stem(), "ACDC Thunderstruck");
        assert_eq!(AnnotatedProperties::defaults("///").file_stem(), UNKNOWN);
    }

    #[test]
    fn test_set_blank_falls_back() {
        let mut props = AnnotatedProperties::defaults("x");
        props.set(Field::Album, "Greatest Hits");
        assert_eq!(props.get(Field::Album), "Greatest Hits");
        props.set(Field::Album, "  ");
        assert_eq!(props.get(Field::Album), UNKNOWN);
        props.set(Field::Artwork, " https://example.com/a.jpg ");
        assert_eq!(props.artwork, "https://example.com/a.jpg");
        props.set(Field::Artwork, "");
        assert!(!props.has_artwork());
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("Album".parse::<Field>().unwrap(), Field::Album);
        assert_eq!("cover".parse::<Field>().unwrap(), Field::Artwork);
        assert!("year".parse::<Field>().is_err());
    }
}
