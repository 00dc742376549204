/// Playback mode types
use serde::{Deserialize, Serialize};

/// Loop mode for the playback session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopMode {
    #[default]
    Off,
    /// Repeat the current track (handled natively by the sink)
    Track,
    /// Wrap around to the start of the project context
    Project,
}

impl LoopMode {
    /// Next mode in the `off -> track -> project -> off` cycle
    #[must_use]
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::Track,
            Self::Track => Self::Project,
            Self::Project => Self::Off,
        }
    }

    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Track => "track",
            Self::Project => "project",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "off" => Some(Self::Off),
            "track" => Some(Self::Track),
            "project" => Some(Self::Project),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoopMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Requested stream quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Source,
    Lossless,
    #[default]
    Lossy,
}

impl Quality {
    /// Query-string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Lossless => "lossless",
            Self::Lossy => "lossy",
        }
    }

    /// Parse from string
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "source" => Some(Self::Source),
            "lossless" => Some(Self::Lossless),
            "lossy" => Some(Self::Lossy),
            _ => None,
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_mode_cycles_through_all_states() {
        let mut mode = LoopMode::Off;
        mode = mode.cycle();
        assert_eq!(mode, LoopMode::Track);
        mode = mode.cycle();
        assert_eq!(mode, LoopMode::Project);
        mode = mode.cycle();
        assert_eq!(mode, LoopMode::Off);
    }

    #[test]
    fn loop_mode_string_round_trip() {
        for mode in [LoopMode::Off, LoopMode::Track, LoopMode::Project] {
            assert_eq!(LoopMode::from_str(mode.as_str()), Some(mode));
        }
        assert_eq!(LoopMode::from_str("shuffle"), None);
    }

    #[test]
    fn quality_defaults_to_lossy() {
        assert_eq!(Quality::default(), Quality::Lossy);
        assert_eq!(
            serde_json::to_string(&Quality::Lossless).unwrap(),
            "\"lossless\""
        );
    }
}
