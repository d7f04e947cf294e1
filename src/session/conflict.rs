use std::collections::HashSet;
use std::fmt::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ConflictKind {
    Overlap,
    Altitude,
    MoonDistance,
    Weather,
    ManualTime,
    SessionWindow,
    InsufficientDuration,
    MountSafety,
}

impl ConflictKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overlap => "overlap",
            Self::Altitude => "altitude",
            Self::MoonDistance => "moon-distance",
            Self::Weather => "weather",
            Self::ManualTime => "manual-time",
            Self::SessionWindow => "session-window",
            Self::InsufficientDuration => "insufficient-duration",
            Self::MountSafety => "mount-safety",
        }
    }
}

impl Display for ConflictKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something the plan could not fully honour.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConflict {
    pub kind: ConflictKind,
    /// `None` for night-wide conflicts.
    pub target_id: Option<Id>,
    pub message: String,
}

impl SessionConflict {
    pub fn for_target(
        kind: ConflictKind,
        target_id: impl Into<Id>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            target_id: Some(target_id.into()),
            message: message.into(),
        }
    }

    pub fn global(kind: ConflictKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            target_id: None,
            message: message.into(),
        }
    }
}

impl Display for SessionConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.target_id {
            Some(id) => write!(f, "[{}] {}: {}", self.kind, id, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

/// Insertion-ordered conflict list without duplicates.
#[derive(Debug, Default)]
pub(crate) struct ConflictLog {
    seen: HashSet<SessionConflict>,
    entries: Vec<SessionConflict>,
}

impl ConflictLog {
    pub fn push(&mut self, conflict: SessionConflict) {
        if self.seen.insert(conflict.clone()) {
            self.entries.push(conflict);
        }
    }

    pub fn extend(&mut self, conflicts: impl IntoIterator<Item = SessionConflict>) {
        for conflict in conflicts {
            self.push(conflict);
        }
    }

    pub fn into_vec(self) -> Vec<SessionConflict> {
        self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_drops_exact_duplicates_only() {
        let mut log = ConflictLog::default();
        log.push(SessionConflict::for_target(ConflictKind::Altitude, "m31", "low"));
        log.push(SessionConflict::for_target(ConflictKind::Altitude, "m31", "low"));
        log.push(SessionConflict::for_target(ConflictKind::Altitude, "m33", "low"));
        log.push(SessionConflict::global(ConflictKind::Weather, "cloudy"));
        let all = log.into_vec();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].target_id.as_deref(), Some("m31"));
        assert_eq!(all[2].target_id, None);
    }

    #[test]
    fn display_includes_kind_and_target() {
        let c = SessionConflict::for_target(ConflictKind::ManualTime, "m42", "bad time");
        assert_eq!(c.to_string(), "[manual-time] m42: bad time");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ConflictKind::InsufficientDuration).unwrap();
        assert_eq!(json, "\"insufficient-duration\"");
    }
}
