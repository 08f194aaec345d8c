/// One entry of a resolved playlist (or the single entry of a video reference).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemDescriptor {
    /// Unique within a batch; used as the key for every per-item result.
    pub title: String,
    /// Provider-specific identifier (the video ID).
    pub external_id: String,
    pub duration_seconds: u64,
}

impl ItemDescriptor {
    pub fn new(title: impl Into<String>, external_id: impl Into<String>, duration_seconds: u64) -> Self {
        Self { title: title.into(), external_id: external_id.into(), duration_seconds }
    }
}

/// Formats a duration as zero-padded `mm:ss`. Minutes are not wrapped into
/// hours, so an 80 minute mix reads `80:00`.
pub fn mmss(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "00:00")]
    #[case(9, "00:09")]
    #[case(61, "01:01")]
    #[case(263, "04:23")]
    #[case(4800, "80:00")]
    fn test_mmss(#[case] seconds: u64, #[case] expected: &str) {
        assert_eq!(mmss(seconds), expected);
    }
}
