use crate::error::{Error, ErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output container for produced files.
///
/// The media host hands us AAC audio in an MP4 container, so [`M4a`](Self::M4a)
/// is "keep what we downloaded" and everything else needs a transcode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Mp3,
    M4a,
}

impl Format {
    /// The container downloaded streams arrive in.
    pub const RAW: Format = Format::M4a;

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
        }
    }

    /// Whether producing this format requires a transcode step.
    pub fn needs_transcode(&self) -> bool {
        *self != Self::RAW
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for Format {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(Self::Mp3),
            // Other names for the same AAC-in-MP4 container.
            "m4a" | "mp4" | "aac" => Ok(Self::M4a),
            _ => exn::bail!(ErrorKind::UnsupportedFormat(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("mp3", Format::Mp3)]
    #[case(" MP3 ", Format::Mp3)]
    #[case("m4a", Format::M4a)]
    #[case("mp4", Format::M4a)]
    #[case("aac", Format::M4a)]
    fn test_from_str(#[case] input: &str, #[case] expected: Format) {
        assert_eq!(input.parse::<Format>().unwrap(), expected);
    }

    #[test]
    fn test_unsupported_format() {
        let err = "flac".parse::<Format>().unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedFormat("flac".to_string()));
    }

    #[test]
    fn test_transcode_needed() {
        assert!(Format::Mp3.needs_transcode());
        assert!(!Format::M4a.needs_transcode());
    }
}
