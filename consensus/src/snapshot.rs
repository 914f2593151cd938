//! Context snapshot: the host's immutable description of "now"
//!
//! A [`ContextSnapshot`] is captured once per query by a
//! [`SnapshotProvider`] and never mutated afterwards.

use chrono::{Local, Timelike};
use serde::{Deserialize, Serialize};

/// Coarse time-of-day bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBucket {
    /// 05:00–11:59
    Morning,
    /// 12:00–16:59
    Afternoon,
    /// 17:00–20:59
    Evening,
    /// 21:00–23:59
    Night,
    /// 00:00–04:59
    LateNight,
}

impl TimeBucket {
    /// Bucket for an hour of the day (0–23; larger values wrap)
    pub fn from_hour(hour: u32) -> Self {
        match hour % 24 {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            21..=23 => Self::Night,
            _ => Self::LateNight,
        }
    }

    /// Bucket for the local wall clock
    pub fn now() -> Self {
        Self::from_hour(Local::now().hour())
    }

    pub fn all() -> &'static [TimeBucket] {
        &[
            Self::Morning,
            Self::Afternoon,
            Self::Evening,
            Self::Night,
            Self::LateNight,
        ]
    }

    /// Night or late night
    pub fn is_night(&self) -> bool {
        matches!(self, Self::Night | Self::LateNight)
    }
}

impl std::fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Morning => write!(f, "morning"),
            Self::Afternoon => write!(f, "afternoon"),
            Self::Evening => write!(f, "evening"),
            Self::Night => write!(f, "night"),
            Self::LateNight => write!(f, "late_night"),
        }
    }
}

/// Operating mode reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatingMode {
    /// No bias
    #[default]
    Normal,
    /// Heads-down engineering
    Focus,
    /// Writing, music, design
    Creative,
    /// Reading and learning
    Research,
    /// Winding down
    Relax,
    /// Release day
    Ship,
}

impl OperatingMode {
    /// Domain terms this mode biases scoring toward
    pub fn bias_terms(&self) -> &'static [&'static str] {
        match self {
            Self::Normal => &[],
            Self::Focus => &["code", "debug", "test", "arch"],
            Self::Creative => &["creative", "writing", "music", "design", "art"],
            Self::Research => &["research", "papers", "learning", "summarize"],
            Self::Relax => &["wellbeing", "relax", "sleep", "meditation"],
            Self::Ship => &["infra", "deploy", "ci", "release", "test"],
        }
    }
}

impl std::str::FromStr for OperatingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "focus" => Ok(Self::Focus),
            "creative" => Ok(Self::Creative),
            "research" => Ok(Self::Research),
            "relax" => Ok(Self::Relax),
            "ship" => Ok(Self::Ship),
            other => Err(format!("unknown operating mode: {other}")),
        }
    }
}

impl std::fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Focus => "focus",
            Self::Creative => "creative",
            Self::Research => "research",
            Self::Relax => "relax",
            Self::Ship => "ship",
        };
        f.write_str(name)
    }
}

/// Immutable per-query context supplied by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSnapshot {
    /// Bundle identifier of the frontmost application
    pub active_app_id: String,
    /// Display name of the frontmost application
    pub active_app_name: String,
    /// Current clipboard text, if any
    pub clipboard: Option<String>,
    /// System CPU load in [0, 1]
    pub cpu_load: f32,
    /// Whether audio is currently playing
    pub is_playing: bool,
    pub track: Option<String>,
    pub artist: Option<String>,
    /// Free-form mood label from the host
    pub mood: Option<String>,
    pub time_bucket: TimeBucket,
    pub mode: OperatingMode,
}

impl Default for ContextSnapshot {
    fn default() -> Self {
        Self {
            active_app_id: String::new(),
            active_app_name: String::new(),
            clipboard: None,
            cpu_load: 0.0,
            is_playing: false,
            track: None,
            artist: None,
            mood: None,
            time_bucket: TimeBucket::now(),
            mode: OperatingMode::Normal,
        }
    }
}

impl ContextSnapshot {
    /// Snapshot for the given frontmost application, stamped with the current time bucket
    pub fn new(app_id: impl Into<String>, app_name: impl Into<String>) -> Self {
        Self {
            active_app_id: app_id.into(),
            active_app_name: app_name.into(),
            ..Self::default()
        }
    }

    pub fn with_clipboard(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        self.clipboard = if text.trim().is_empty() {
            None
        } else {
            Some(text)
        };
        self
    }

    pub fn with_playback(mut self, track: impl Into<String>, artist: impl Into<String>) -> Self {
        self.is_playing = true;
        self.track = Some(track.into());
        self.artist = Some(artist.into());
        self
    }

    pub fn with_mood(mut self, mood: impl Into<String>) -> Self {
        self.mood = Some(mood.into());
        self
    }

    pub fn with_cpu_load(mut self, load: f32) -> Self {
        self.cpu_load = load.clamp(0.0, 1.0);
        self
    }

    pub fn with_time_bucket(mut self, bucket: TimeBucket) -> Self {
        self.time_bucket = bucket;
        self
    }

    pub fn with_mode(mut self, mode: OperatingMode) -> Self {
        self.mode = mode;
        self
    }

    /// Clipboard text when present and non-blank
    pub fn clipboard_text(&self) -> Option<&str> {
        self.clipboard.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// Collaborator that assembles a [`ContextSnapshot`] for the current query
///
/// Implementations must be cheap and non-blocking.
pub trait SnapshotProvider: Send + Sync {
    fn capture(&self) -> ContextSnapshot;
}

/// Collaborator that reports the host's current operating mode
pub trait OperatingModeProvider: Send + Sync {
    fn current_mode(&self) -> OperatingMode;
}

impl OperatingModeProvider for OperatingMode {
    fn current_mode(&self) -> OperatingMode {
        *self
    }
}

/// Provider that always returns the same snapshot, stamped with `mode_provider`'s mode
pub struct FixedSnapshotProvider<M: OperatingModeProvider = OperatingMode> {
    snapshot: ContextSnapshot,
    mode_provider: M,
}

impl FixedSnapshotProvider<OperatingMode> {
    pub fn new(snapshot: ContextSnapshot) -> Self {
        let mode = snapshot.mode;
        Self {
            snapshot,
            mode_provider: mode,
        }
    }
}

impl<M: OperatingModeProvider> FixedSnapshotProvider<M> {
    pub fn with_mode_provider(snapshot: ContextSnapshot, mode_provider: M) -> Self {
        Self {
            snapshot,
            mode_provider,
        }
    }
}

impl<M: OperatingModeProvider> SnapshotProvider for FixedSnapshotProvider<M> {
    fn capture(&self) -> ContextSnapshot {
        self.snapshot
            .clone()
            .with_mode(self.mode_provider.current_mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_bucket_boundaries() {
        assert_eq!(TimeBucket::from_hour(0), TimeBucket::LateNight);
        assert_eq!(TimeBucket::from_hour(4), TimeBucket::LateNight);
        assert_eq!(TimeBucket::from_hour(5), TimeBucket::Morning);
        assert_eq!(TimeBucket::from_hour(12), TimeBucket::Afternoon);
        assert_eq!(TimeBucket::from_hour(17), TimeBucket::Evening);
        assert_eq!(TimeBucket::from_hour(21), TimeBucket::Night);
        assert_eq!(TimeBucket::from_hour(26), TimeBucket::LateNight);
        assert!(TimeBucket::LateNight.is_night());
        assert!(!TimeBucket::Evening.is_night());
    }

    #[test]
    fn test_blank_clipboard_is_none() {
        let snap = ContextSnapshot::new("com.apple.dt.Xcode", "Xcode").with_clipboard("   \n");
        assert!(snap.clipboard.is_none());
        assert!(snap.clipboard_text().is_none());
    }

    #[test]
    fn test_mode_parse_roundtrip() {
        for mode in [
            OperatingMode::Normal,
            OperatingMode::Focus,
            OperatingMode::Creative,
            OperatingMode::Research,
            OperatingMode::Relax,
            OperatingMode::Ship,
        ] {
            assert_eq!(mode.to_string().parse::<OperatingMode>().unwrap(), mode);
        }
        assert!("party".parse::<OperatingMode>().is_err());
    }

    #[test]
    fn test_fixed_provider_applies_mode() {
        let provider = FixedSnapshotProvider::with_mode_provider(
            ContextSnapshot::new("com.apple.Terminal", "Terminal"),
            OperatingMode::Ship,
        );
        let snap = provider.capture();
        assert_eq!(snap.mode, OperatingMode::Ship);
        assert_eq!(snap.active_app_id, "com.apple.Terminal");
    }
}
