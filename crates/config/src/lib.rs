//! Layered configuration.
//!
//! Lowest to highest precedence:
//!
//! 1. built-in defaults
//! 2. `config.toml` in the platform configuration directory
//! 3. an explicit file (`.toml`, `.yaml`/`.yml` or `.json`)
//! 4. `CASSETTE_*` environment variables, nested with `__`
//!    (`CASSETTE_TOOLS__FFMPEG=/opt/bin/ffmpeg`)
//!
//! Command-line flags are applied on top by the binary, followed by another
//! call to [`Config::validate`].

pub mod error;

use crate::error::{ErrorKind, Result};
use cassette_model::Format;
use directories::{ProjectDirs, UserDirs};
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format as _, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

pub const ENV_PREFIX: &str = "CASSETTE_";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where finished files are written.
    pub destination: PathBuf,
    pub format: Format,
    pub workers: usize,
    /// Soft per-item timeout for every pool stage; `None` waits forever.
    pub item_timeout_secs: Option<u64>,
    /// How often a reference is resolved before network failures are given up on.
    pub resolve_attempts: u32,
    pub annotate: bool,
    /// Name of the scratch directory created inside `destination`.
    pub scratch_dir_name: String,
    pub tools: Tools,
    pub http: Http,
    pub itunes: ITunes,
    pub oembed: OEmbed,
}

/// Explicit paths to external programs. Unset means "search `PATH`".
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub yt_dlp: Option<PathBuf>,
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Http {
    pub user_agent: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ITunes {
    pub base_url: String,
    pub country: Option<String>,
    /// Edge length of the requested cover art, in pixels.
    pub artwork_size: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OEmbed {
    pub base_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination: default_destination(),
            format: Format::default(),
            workers: 8,
            item_timeout_secs: Some(600),
            resolve_attempts: 5,
            annotate: false,
            scratch_dir_name: ".cassette-scratch".to_string(),
            tools: Tools::default(),
            http: Http::default(),
            itunes: ITunes::default(),
            oembed: OEmbed::default(),
        }
    }
}

impl Default for Http {
    fn default() -> Self {
        Self {
            user_agent: concat!("cassette/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ITunes {
    fn default() -> Self {
        Self {
            base_url: "https://itunes.apple.com/search".to_string(),
            country: None,
            artwork_size: 600,
        }
    }
}

impl Default for OEmbed {
    fn default() -> Self {
        Self { base_url: "https://www.youtube.com/oembed".to_string() }
    }
}

fn default_destination() -> PathBuf {
    UserDirs::new()
        .and_then(|dirs| dirs.audio_dir().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `config.toml` in the platform configuration directory, if there is one.
pub fn default_file() -> Option<PathBuf> {
    ProjectDirs::from("", "", "cassette").map(|dirs| dirs.config_dir().join("config.toml"))
}

impl Config {
    /// Loads every layer, including the process environment.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::from_sources(default_file().as_deref(), explicit, Some(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads from the given layers only. A missing `user` file is skipped, a
    /// missing `explicit` file is an error.
    pub fn from_sources(user: Option<&Path>, explicit: Option<&Path>, env: Option<Env>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(user) = user {
            tracing::debug!(path = %user.display(), "Reading user configuration");
            figment = figment.merge(Toml::file(user));
        }
        if let Some(explicit) = explicit {
            if !explicit.is_file() {
                exn::bail!(ErrorKind::NotFound(explicit.to_path_buf()));
            }
            let extension = explicit.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
            figment = match extension.as_deref() {
                Some("toml") => figment.merge(Toml::file(explicit)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(explicit)),
                Some("json") => figment.merge(Json::file(explicit)),
                _ => exn::bail!(ErrorKind::UnsupportedFile(explicit.to_path_buf())),
            };
        }
        if let Some(env) = env {
            figment = figment.merge(env);
        }
        let config: Self = figment.extract().or_raise(|| ErrorKind::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| exn::Exn::from(ErrorKind::Invalid(reason.to_string()));
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1"));
        }
        if self.resolve_attempts == 0 {
            return Err(invalid("resolve_attempts must be at least 1"));
        }
        if self.item_timeout_secs == Some(0) {
            return Err(invalid("item_timeout_secs must be positive"));
        }
        if self.http.timeout_secs == 0 {
            return Err(invalid("http.timeout_secs must be positive"));
        }
        if self.itunes.artwork_size == 0 {
            return Err(invalid("itunes.artwork_size must be positive"));
        }
        let mut components = Path::new(&self.scratch_dir_name).components();
        if !matches!((components.next(), components.next()), (Some(Component::Normal(_)), None)) {
            return Err(invalid("scratch_dir_name must be a single directory name"));
        }
        Ok(())
    }

    pub fn item_timeout(&self) -> Option<Duration> {
        self.item_timeout_secs.map(Duration::from_secs)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// The scratch directory for a batch writing into `destination`.
    pub fn scratch_dir(&self) -> PathBuf {
        self.destination.join(&self.scratch_dir_name)
    }
}
