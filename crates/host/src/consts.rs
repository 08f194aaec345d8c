use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

pub(crate) const WATCH_URL: &str = "https://www.youtube.com/watch?v=";
pub(crate) const PLAYLIST_URL: &str = "https://www.youtube.com/playlist?list=";

/// Hosts we accept references for.
pub(crate) const HOSTS: &[&str] = &["youtube.com", "www.youtube.com", "m.youtube.com", "music.youtube.com", "youtu.be"];

/// Audio-only AAC-LC, falling back to whatever M4A audio exists.
pub(crate) const AUDIO_FORMAT: &str = "bestaudio[acodec^=mp4a.40.2]/bestaudio[ext=m4a]";

regex!(VIDEO_ID_REGEX, r"^[A-Za-z0-9_-]{11}$");
regex!(PLAYLIST_ID_REGEX, r"^[A-Za-z0-9_-]{2,64}$");
