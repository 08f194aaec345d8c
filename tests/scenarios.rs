use cassette::batch::error::ErrorKind;
use cassette::{AnnotationStatus, BatchEvent, BatchOrchestrator, Services};
use cassette_acquire::{MockArtwork, MockTags, MockTranscoder};
use cassette_annotate::{MockProvider, MockTitles, Track};
use cassette_config::Config;
use cassette_host::MockHost;
use cassette_host::error::ErrorKind as HostErrorKind;
use cassette_model::{Field, Format, UNKNOWN};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const PLAYLIST: &str = "https://www.youtube.com/playlist?list=PLmix";
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

fn three_songs() -> MockHost {
    MockHost::default()
        .with_playlist("PLmix", ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"])
        .with_video("aaaaaaaaaaa", "Stuck on you", 263)
        .with_video("bbbbbbbbbbb", "Mystery", 100)
        .with_video("ccccccccccc", "Broken", 10)
}

/// A match for `term`; its artwork lives under the term, whatever the match is called.
fn track(term: &str, name: &str, artist: &str) -> Track {
    Track {
        name: Some(name.into()),
        album: Some("Greatest Hits".into()),
        artist: Some(artist.into()),
        genre: Some("Pop".into()),
        artwork_url: Some(format!("https://art.example.com/{term}/600x600bb.jpg")),
        length_minutes: Some(3.0),
    }
}

struct Harness {
    destination: TempDir,
    config: Config,
    host: Arc<MockHost>,
    provider: Arc<MockProvider>,
    transcoder: Arc<MockTranscoder>,
    tags: Arc<MockTags>,
}

impl Harness {
    fn new(host: MockHost, provider: MockProvider) -> Self {
        let destination = tempfile::tempdir().unwrap();
        let config = Config { destination: destination.path().to_path_buf(), workers: 2, ..Config::default() };
        Self {
            destination,
            config,
            host: Arc::new(host),
            provider: Arc::new(provider),
            transcoder: Arc::new(MockTranscoder::default()),
            tags: Arc::new(MockTags::default()),
        }
    }

    fn orchestrator(&self) -> BatchOrchestrator {
        let artwork = MockArtwork::default()
            .with_artwork("https://art.example.com/Stuck on you/600x600bb.jpg", JPEG)
            .with_artwork("https://art.example.com/Mystery/600x600bb.jpg", JPEG)
            .with_artwork("https://art.example.com/Broken/600x600bb.jpg", JPEG);
        let services = Services {
            host: self.host.clone(),
            provider: self.provider.clone(),
            titles: Arc::new(MockTitles::default()),
            transcoder: self.transcoder.clone(),
            artwork: Arc::new(artwork),
            tags: self.tags.clone(),
        };
        BatchOrchestrator::new(self.config.clone(), services)
    }

    fn path(&self) -> &Path {
        self.destination.path()
    }

    fn scratch_exists(&self) -> bool {
        self.config.scratch_dir().exists()
    }

    fn published(&self) -> Vec<String> {
        let mut names: Vec<_> = std::fs::read_dir(self.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

#[tokio::test]
async fn test_everything_annotates_and_acquires() {
    let provider = MockProvider::default()
        .with_track("Stuck on you", track("Stuck on you", "Stuck On You", "Lionel Richie"))
        .with_track("Mystery", track("Mystery", "Mystery", "INXS"))
        .with_track("Broken", track("Broken", "Broken", "Seether"));
    let mut harness = Harness::new(three_songs(), provider);
    harness.config.annotate = true;

    let result = harness.orchestrator().run(PLAYLIST, harness.path(), Format::Mp3).await.unwrap();
    assert_eq!(result.succeeded, 3);
    assert!(result.failed_titles.is_empty());
    assert!(result.is_complete_success());
    assert_eq!(result.annotation, AnnotationStatus::Matched(3));
    assert_eq!(harness.published(), ["Broken.mp3", "Mystery.mp3", "Stuck On You.mp3"]);
    assert!(!harness.scratch_exists());

    let writes = harness.tags.writes();
    assert_eq!(writes.len(), 3);
    assert!(writes.iter().all(|write| write.properties.album == "Greatest Hits" && write.artwork.is_some()));
}

#[tokio::test]
async fn test_no_metadata_falls_back_to_defaults() {
    let mut harness = Harness::new(three_songs(), MockProvider::default());
    harness.config.annotate = true;

    let result = harness.orchestrator().run(PLAYLIST, harness.path(), Format::Mp3).await.unwrap();
    assert_eq!(result.annotation, AnnotationStatus::NoMetadata);
    assert_eq!(result.succeeded, 3);
    assert_eq!(harness.provider.searches(), 3);
    for write in harness.tags.writes() {
        assert_eq!(write.properties.artist, UNKNOWN);
        assert_eq!(write.properties.album, UNKNOWN);
        assert_eq!(write.artwork, None);
    }
}

#[tokio::test]
async fn test_one_failed_download_does_not_stop_the_others() {
    let host = three_songs()
        .with_download_failure("bbbbbbbbbbb", HostErrorKind::UpstreamRejected("Video unavailable".into()));
    let harness = Harness::new(host, MockProvider::default());

    let result = harness.orchestrator().run(PLAYLIST, harness.path(), Format::Mp3).await.unwrap();
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed_titles, ["Mystery"]);
    assert!(!result.is_complete_success());
    assert_eq!(result.annotation, AnnotationStatus::NotRequested);
    assert_eq!(harness.published(), ["Broken.mp3", "Stuck on you.mp3"]);
    assert!(!harness.scratch_exists());
}

#[tokio::test]
async fn test_invalid_reference_aborts_before_anything_happens() {
    let harness = Harness::new(three_songs(), MockProvider::default());

    let err = harness.orchestrator().run("not a url", harness.path(), Format::Mp3).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::InvalidReference(_)));
    assert_eq!(harness.host.playlist_calls(), 0);
    assert!(!harness.scratch_exists());
    assert!(harness.published().is_empty());
}

#[tokio::test]
async fn test_reattempts_are_bounded() {
    let harness = Harness::new(three_songs().with_outages(100), MockProvider::default());

    let err = harness.orchestrator().run(PLAYLIST, harness.path(), Format::Mp3).await.unwrap_err();
    assert_eq!(*err, ErrorKind::ReattemptExhausted(5));
    assert!(err.is_retryable());
    assert_eq!(harness.host.playlist_calls(), 5);
    assert!(!harness.scratch_exists());
}

#[tokio::test]
async fn test_reattempt_recovers_from_a_short_outage() {
    let harness = Harness::new(three_songs().with_outages(2), MockProvider::default());
    let events = Arc::new(Mutex::new(Vec::new()));
    let seen = events.clone();
    let orchestrator = harness
        .orchestrator()
        .with_observer(Arc::new(move |event: &BatchEvent| seen.lock().unwrap().push(event.clone())));

    let result = orchestrator.run(PLAYLIST, harness.path(), Format::M4a).await.unwrap();
    assert_eq!(result.succeeded, 3);
    assert_eq!(harness.host.playlist_calls(), 3);
    assert_eq!(harness.transcoder.conversions(), 0);
    assert_eq!(harness.published(), ["Broken.m4a", "Mystery.m4a", "Stuck on you.m4a"]);

    let events = events.lock().unwrap();
    assert_eq!(events[0], BatchEvent::ResolveAttempt { attempt: 1, of: 5 });
    assert_eq!(events[2], BatchEvent::ResolveAttempt { attempt: 3, of: 5 });
    assert_eq!(events[3], BatchEvent::Resolved { items: 3 });
    let finished: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            BatchEvent::ItemFinished { title, ok } => Some((title.as_str(), *ok)),
            _ => None,
        })
        .collect();
    assert_eq!(finished, [("Stuck on you", true), ("Mystery", true), ("Broken", true)]);
    assert!(matches!(events.last(), Some(BatchEvent::Complete { succeeded: 3, failed: 0, .. })));
}

#[tokio::test]
async fn test_duplicate_titles_collapse() {
    let host = MockHost::default()
        .with_playlist("PLmix", ["aaaaaaaaaaa", "bbbbbbbbbbb", "ccccccccccc"])
        .with_video("aaaaaaaaaaa", "Mystery", 263)
        .with_video("bbbbbbbbbbb", "Broken", 100)
        .with_video("ccccccccccc", "Mystery", 10);
    let harness = Harness::new(host, MockProvider::default());

    let playlist = harness.orchestrator().resolve(PLAYLIST).await.unwrap();
    assert_eq!(playlist.titles().collect::<Vec<_>>(), ["Mystery", "Broken"]);
    assert_eq!(playlist.get("Mystery").unwrap().item.external_id, "ccccccccccc");
}

#[tokio::test]
async fn test_edits_between_prepare_and_acquire_are_written() {
    let harness = Harness::new(three_songs(), MockProvider::default());
    let orchestrator = harness.orchestrator();

    let mut prepared = orchestrator.prepare(PLAYLIST).await.unwrap();
    assert_eq!(prepared.playlist.set_all(Field::Album, "Road Trip"), 3);
    assert!(prepared.playlist.set("Broken", Field::Song, "Broken (Live)"));
    let result = orchestrator.acquire(&prepared.playlist, harness.path(), Format::Mp3).await.unwrap();

    assert_eq!(result.succeeded, 3);
    assert!(harness.tags.writes().iter().all(|write| write.properties.album == "Road Trip"));
    assert!(harness.path().join("Broken (Live).mp3").exists());
}

#[tokio::test]
async fn test_missing_destination_is_a_setup_failure() {
    let harness = Harness::new(three_songs(), MockProvider::default());
    let missing = harness.path().join("nowhere");

    let err = harness.orchestrator().run(PLAYLIST, &missing, Format::Mp3).await.unwrap_err();
    assert!(matches!(&*err, ErrorKind::BatchSetup(_)));
    assert_eq!(harness.host.download_calls(), 0);
    assert!(!missing.exists());
}

#[tokio::test]
async fn test_nothing_resolved() {
    let host = MockHost::default().with_playlist("PLmix", ["aaaaaaaaaaa"]).with_untitled_video("aaaaaaaaaaa");
    let harness = Harness::new(host, MockProvider::default());

    let err = harness.orchestrator().run(PLAYLIST, harness.path(), Format::Mp3).await.unwrap_err();
    assert_eq!(*err, ErrorKind::NothingResolved);
    assert!(!harness.scratch_exists());
}

#[tokio::test]
async fn test_timed_out_item_fails_and_never_publishes() {
    let host = three_songs().with_download_delay("bbbbbbbbbbb", Duration::from_millis(2500));
    let mut harness = Harness::new(host, MockProvider::default());
    harness.config.item_timeout_secs = Some(1);

    let result = harness.orchestrator().run(PLAYLIST, harness.path(), Format::Mp3).await.unwrap();
    assert_eq!(result.succeeded, 2);
    assert_eq!(result.failed_titles, ["Mystery"]);
    assert!(!harness.scratch_exists());

    // Let the abandoned download finish late.
    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(harness.host.download_calls(), 3);
    assert_eq!(harness.published(), ["Broken.mp3", "Stuck on you.mp3"]);
    assert!(!harness.scratch_exists());
}

#[tokio::test]
async fn test_rejected_single_video_resolves_to_nothing() {
    let host = three_songs()
        .with_video_error("privateeeee", HostErrorKind::UpstreamRejected("Private video".into()));
    let harness = Harness::new(host, MockProvider::default());

    let err = harness
        .orchestrator()
        .run("https://youtu.be/privateeeee", harness.path(), Format::Mp3)
        .await
        .unwrap_err();
    assert_eq!(*err, ErrorKind::NothingResolved);
    assert_eq!(harness.host.download_calls(), 0);
    assert!(!harness.scratch_exists());
}
