use crate::error::ErrorKind;

// Matched case-insensitively against whatever the host tooling printed.
const INVALID: &[&str] = &[
    "is not a valid url",
    "unsupported url",
    "incomplete youtube id",
    "invalid playlist id",
];
const NETWORK: &[&str] = &[
    "nodename nor servname provided",
    "name or service not known",
    "temporary failure in name resolution",
    "failed to resolve",
    "network is unreachable",
    "connection refused",
    "connection reset",
    "timed out",
    "urlopen error",
    "http error 5",
];
const REJECTED: &[&str] = &[
    "video unavailable",
    "private video",
    "has been removed",
    "members-only",
    "sign in to confirm",
    "not available in your country",
    "playlist does not exist",
    "http error 404",
    "http error 403",
];

/// Classifies a host error message.
///
/// Rejections are checked before network errors because the host tooling
/// likes to wrap a rejection in a generic HTTP failure.
///
/// ```
/// use cassette_host::classify;
/// use cassette_host::error::ErrorKind;
///
/// let kind = classify("ERROR: [youtube] abc: Private video. Sign in if you've been granted access");
/// assert!(matches!(kind, ErrorKind::UpstreamRejected(_)));
/// ```
pub fn classify(message: &str) -> ErrorKind {
    let lower = message.to_ascii_lowercase();
    let summary = summarise(message);
    if INVALID.iter().any(|needle| lower.contains(needle)) {
        ErrorKind::InvalidReference(summary)
    } else if REJECTED.iter().any(|needle| lower.contains(needle)) {
        ErrorKind::UpstreamRejected(summary)
    } else if NETWORK.iter().any(|needle| lower.contains(needle)) {
        ErrorKind::TransientNetwork
    } else {
        ErrorKind::ToolFailed(summary)
    }
}

/// Last non-empty line, which is where `yt-dlp` puts its `ERROR:` line.
fn summarise(message: &str) -> String {
    let line = message.lines().rev().map(str::trim).find(|l| !l.is_empty()).unwrap_or("unknown error");
    line.strip_prefix("ERROR:").map(str::trim).unwrap_or(line).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("ERROR: 'not a url' is not a valid URL.", "invalid")]
    #[case("ERROR: Unsupported URL: https://example.com", "invalid")]
    #[case("ERROR: [youtube] xyz: Video unavailable", "rejected")]
    #[case("ERROR: [youtube] xyz: Private video", "rejected")]
    #[case("ERROR: Unable to download: HTTP Error 404: Not Found", "rejected")]
    #[case("ERROR: <urlopen error [Errno 8] nodename nor servname provided, or not known>", "network")]
    #[case("ERROR: <urlopen error [Errno -3] Temporary failure in name resolution>", "network")]
    #[case("ERROR: Read timed out.", "network")]
    #[case("ERROR: HTTP Error 503: Service Unavailable", "network")]
    #[case("Segmentation fault", "other")]
    fn test_classify(#[case] message: &str, #[case] expected: &str) {
        let kind = classify(message);
        let actual = match kind {
            ErrorKind::InvalidReference(_) => "invalid",
            ErrorKind::UpstreamRejected(_) => "rejected",
            ErrorKind::TransientNetwork => "network",
            _ => "other",
        };
        assert_eq!(actual, expected, "{message}");
    }

    #[test]
    fn test_summary_is_last_error_line() {
        let kind = classify("WARNING: something\nERROR: [youtube] abc: Video unavailable\n\n");
        assert_eq!(kind, ErrorKind::UpstreamRejected("[youtube] abc: Video unavailable".into()));
    }
}
