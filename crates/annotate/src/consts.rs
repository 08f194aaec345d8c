use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

pub(crate) const ITUNES_SEARCH_URL: &str = "https://itunes.apple.com/search";
pub(crate) const OEMBED_URL: &str = "https://www.youtube.com/oembed";
pub(crate) const DEFAULT_ARTWORK_SIZE: u32 = 600;
pub(crate) const SEARCH_LIMIT: u8 = 10;

// The size token in the final path segment, e.g. `60x60bb.jpg`.
regex!(ARTWORK_SIZE_REGEX, r"\d+x\d+(bb)?(\.[A-Za-z]+)$");
