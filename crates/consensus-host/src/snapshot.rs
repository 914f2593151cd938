//! Snapshot provider backed by CLI flags and the process environment

use consensus_engine::{
    ContextSnapshot, OperatingMode, OperatingModeProvider, SnapshotProvider, TimeBucket,
};
use tracing::warn;

/// Environment variable consulted for the operating mode on every capture
pub const MODE_ENV: &str = "CONSENSUS_MODE";

/// Reads the operating mode from [`MODE_ENV`], falling back to a fixed mode
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvModeProvider {
    fallback: OperatingMode,
}

impl EnvModeProvider {
    pub fn new(fallback: OperatingMode) -> Self {
        Self { fallback }
    }

    fn resolve(&self, raw: Option<String>) -> OperatingMode {
        match raw {
            Some(raw) if !raw.trim().is_empty() => raw.parse().unwrap_or_else(|e: String| {
                warn!(var = MODE_ENV, value = %raw, error = %e, "Ignoring invalid mode");
                self.fallback
            }),
            _ => self.fallback,
        }
    }
}

impl OperatingModeProvider for EnvModeProvider {
    fn current_mode(&self) -> OperatingMode {
        self.resolve(std::env::var(MODE_ENV).ok())
    }
}

/// Split `"Track - Artist"`; a bare title gets an empty artist
pub fn parse_playback(raw: &str) -> (String, String) {
    match raw.split_once(" - ") {
        Some((track, artist)) => (track.trim().to_string(), artist.trim().to_string()),
        None => (raw.trim().to_string(), String::new()),
    }
}

/// Host-side description of the foreground context
///
/// The time bucket is taken from the wall clock at capture time unless an
/// hour is pinned.
pub struct HostSnapshotProvider<M: OperatingModeProvider = EnvModeProvider> {
    app_id: String,
    app_name: String,
    clipboard: Option<String>,
    playback: Option<(String, String)>,
    mood: Option<String>,
    hour: Option<u32>,
    mode_provider: M,
}

impl HostSnapshotProvider<EnvModeProvider> {
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_name: app_name.into(),
            clipboard: None,
            playback: None,
            mood: None,
            hour: None,
            mode_provider: EnvModeProvider::default(),
        }
    }
}

impl<M: OperatingModeProvider> HostSnapshotProvider<M> {
    pub fn with_mode_provider<N: OperatingModeProvider>(self, mode_provider: N) -> HostSnapshotProvider<N> {
        HostSnapshotProvider {
            app_id: self.app_id,
            app_name: self.app_name,
            clipboard: self.clipboard,
            playback: self.playback,
            mood: self.mood,
            hour: self.hour,
            mode_provider,
        }
    }

    pub fn with_clipboard(mut self, text: Option<String>) -> Self {
        self.clipboard = text;
        self
    }

    pub fn with_playback(mut self, track: impl Into<String>, artist: impl Into<String>) -> Self {
        self.playback = Some((track.into(), artist.into()));
        self
    }

    pub fn with_mood(mut self, mood: Option<String>) -> Self {
        self.mood = mood;
        self
    }

    pub fn with_hour(mut self, hour: Option<u32>) -> Self {
        self.hour = hour;
        self
    }
}

impl<M: OperatingModeProvider> SnapshotProvider for HostSnapshotProvider<M> {
    fn capture(&self) -> ContextSnapshot {
        let bucket = self.hour.map(TimeBucket::from_hour).unwrap_or_else(TimeBucket::now);
        let mut snapshot = ContextSnapshot::new(&self.app_id, &self.app_name)
            .with_time_bucket(bucket)
            .with_mode(self.mode_provider.current_mode());
        if let Some(text) = &self.clipboard {
            snapshot = snapshot.with_clipboard(text.as_str());
        }
        if let Some((track, artist)) = &self.playback {
            snapshot = snapshot.with_playback(track.as_str(), artist.as_str());
        }
        if let Some(mood) = &self.mood {
            snapshot = snapshot.with_mood(mood.as_str());
        }
        snapshot
    }
}
