use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Type tag of a session: which concrete view a persisted record rebuilds.
///
/// The set is closed. A tag read from storage that does not parse is a
/// configuration error (a view type was removed without migrating its rows),
/// not a per-request failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Editing form for the per-channel experience settings.
    LevelingConfig,
    /// Paged wizard ordering reward roles by priority.
    RolePriority,
}

impl SessionKind {
    pub const ALL: [SessionKind; 2] = [SessionKind::LevelingConfig, SessionKind::RolePriority];

    pub fn as_str(&self) -> &'static str {
        match self {
            SessionKind::LevelingConfig => "leveling_config",
            SessionKind::RolePriority => "role_priority",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "leveling_config" => Ok(SessionKind::LevelingConfig),
            "role_priority" => Ok(SessionKind::RolePriority),
            other => Err(format!("unknown session kind: '{other}'")),
        }
    }
}

/// Lifecycle state, derived from the `active`/`stopped` flag pair.
///
/// - Created: constructed, not yet in the active index
/// - Active: resident and receiving interactions
/// - Stopped: terminal; can never be activated again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Created,
    Active,
    Stopped,
}

impl SessionState {
    pub fn from_flags(active: bool, stopped: bool) -> Self {
        match (active, stopped) {
            (_, true) => SessionState::Stopped,
            (true, false) => SessionState::Active,
            (false, false) => SessionState::Created,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Created => write!(f, "created"),
            SessionState::Active => write!(f, "active"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in SessionKind::ALL {
            assert_eq!(kind.to_string().parse::<SessionKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_unknown_kind_is_rejected() {
        let err = "wheel_spin".parse::<SessionKind>().unwrap_err();
        assert!(err.contains("wheel_spin"));
    }

    #[test]
    fn test_state_from_flags() {
        assert_eq!(SessionState::from_flags(false, false), SessionState::Created);
        assert_eq!(SessionState::from_flags(true, false), SessionState::Active);
        assert_eq!(SessionState::from_flags(false, true), SessionState::Stopped);
    }
}
