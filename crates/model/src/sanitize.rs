//! Filename rules.
//!
//! A song name ends up as a filename component in both the scratch and the
//! destination directory, so it has to be safe on every filesystem we might
//! write to.

/// Characters that never make it into a filename.
pub const ILLEGAL_CHARACTERS: &[char] =
    &['/', '\\', '?', '"', '*', '^', '%', '$', '#', '~', '<', '>', ',', ';', ':', '|'];

/// Strips [illegal characters](ILLEGAL_CHARACTERS) and control characters
/// from a song name, then trims surrounding whitespace.
///
/// Sanitizing is a fixed point: sanitizing an already sanitized string
/// returns it unchanged.
///
/// # Examples
///
/// ```
/// use cassette_model::sanitize;
///
/// assert_eq!(sanitize("AC/DC: Back in Black"), "ACDC Back in Black");
/// assert_eq!(sanitize("  What? Why!  "), "What Why!");
/// assert_eq!(sanitize(&sanitize("a|b<c>")), sanitize("a|b<c>"));
/// ```
pub fn sanitize(song: &str) -> String {
    // Strip first, trim second: stripping can expose new surrounding
    // whitespace, trimming can never expose an illegal character.
    let stripped: String = song.chars().filter(|c| !ILLEGAL_CHARACTERS.contains(c) && !c.is_control()).collect();
    stripped.trim().to_string()
}
