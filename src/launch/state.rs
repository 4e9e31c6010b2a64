//! Lifecycle state and protocol version tags for launch accounts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a launch, derived from the on-chain state enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LaunchState {
    /// Account created but funding not opened yet (`initialized` on chain)
    Uninitialized,
    Live,
    Closed,
    Completed,
    Refunding,
    Unknown,
}

impl LaunchState {
    pub const ALL: [LaunchState; 6] = [
        LaunchState::Uninitialized,
        LaunchState::Live,
        LaunchState::Closed,
        LaunchState::Completed,
        LaunchState::Refunding,
        LaunchState::Unknown,
    ];

    /// Map a single on-chain state key to a lifecycle state.
    ///
    /// Returns `None` for keys that are not part of any known schema.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "live" => Some(Self::Live),
            "complete" | "completed" => Some(Self::Completed),
            "initialized" => Some(Self::Uninitialized),
            "closed" => Some(Self::Closed),
            "refunding" => Some(Self::Refunding),
            _ => None,
        }
    }

    /// Only live launches accept contributions.
    pub fn accepts_contributions(self) -> bool {
        self == Self::Live
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Live => "live",
            Self::Closed => "closed",
            Self::Completed => "completed",
            Self::Refunding => "refunding",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LaunchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "unknown" {
            return Ok(Self::Unknown);
        }
        if lower == "uninitialized" {
            return Ok(Self::Uninitialized);
        }
        Self::from_flag(&lower).ok_or_else(|| format!("unknown launch state '{}'", s))
    }
}

/// Launchpad protocol version an account was read with.
///
/// Ordering matters: when the same address shows up under several versions
/// the greatest tag wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LaunchVersion {
    #[serde(rename = "v0.5")]
    V05,
    #[serde(rename = "v0.6")]
    V06,
    #[serde(rename = "v0.7")]
    V07,
}

impl LaunchVersion {
    /// Newest first, the order accounts are listed in.
    pub const ALL: [LaunchVersion; 3] = [LaunchVersion::V07, LaunchVersion::V06, LaunchVersion::V05];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V05 => "v0.5",
            Self::V06 => "v0.6",
            Self::V07 => "v0.7",
        }
    }
}

impl fmt::Display for LaunchVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LaunchVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches('v') {
            "0.5" => Ok(Self::V05),
            "0.6" => Ok(Self::V06),
            "0.7" => Ok(Self::V07),
            _ => Err(format!("unsupported launchpad version '{}'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_ordering_prefers_newest() {
        assert!(LaunchVersion::V07 > LaunchVersion::V06);
        assert!(LaunchVersion::V06 > LaunchVersion::V05);
        assert_eq!(LaunchVersion::ALL.iter().max(), Some(&LaunchVersion::V07));
    }

    #[test]
    fn test_version_parse_and_display() {
        assert_eq!("v0.6".parse::<LaunchVersion>().unwrap(), LaunchVersion::V06);
        assert_eq!("0.7".parse::<LaunchVersion>().unwrap(), LaunchVersion::V07);
        assert!("v1.0".parse::<LaunchVersion>().is_err());
        assert_eq!(LaunchVersion::V05.to_string(), "v0.5");
    }

    #[test]
    fn test_version_serde_uses_display_tags() {
        let json = serde_json::to_string(&LaunchVersion::V07).unwrap();
        assert_eq!(json, "\"v0.7\"");
        let back: LaunchVersion = serde_json::from_str("\"v0.5\"").unwrap();
        assert_eq!(back, LaunchVersion::V05);
    }

    #[test]
    fn test_state_flags() {
        assert_eq!(LaunchState::from_flag("complete"), Some(LaunchState::Completed));
        assert_eq!(LaunchState::from_flag("completed"), Some(LaunchState::Completed));
        assert_eq!(LaunchState::from_flag("initialized"), Some(LaunchState::Uninitialized));
        assert_eq!(LaunchState::from_flag("paused"), None);
    }

    #[test]
    fn test_state_from_str() {
        assert_eq!("Live".parse::<LaunchState>().unwrap(), LaunchState::Live);
        assert_eq!("unknown".parse::<LaunchState>().unwrap(), LaunchState::Unknown);
        assert!("bogus".parse::<LaunchState>().is_err());
    }

    #[test]
    fn test_json_and_display_spell_states_alike() {
        for state in LaunchState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{}\"", state));
            assert_eq!(state.to_string().parse::<LaunchState>().unwrap(), state);
        }
        assert_eq!(LaunchState::Uninitialized.to_string(), "uninitialized");
        assert_eq!("initialized".parse::<LaunchState>().unwrap(), LaunchState::Uninitialized);
    }

    #[test]
    fn test_only_live_accepts_contributions() {
        for state in LaunchState::ALL {
            assert_eq!(state.accepts_contributions(), state == LaunchState::Live);
        }
    }
}
