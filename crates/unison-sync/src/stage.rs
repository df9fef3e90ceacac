//! Sync call state machine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Step of one sync call.
///
/// Steps run strictly in order; `Failed` is reachable from every
/// non-terminal step and absorbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SyncStage {
    Validating,
    MappingOut,
    RemoteCall,
    MappingIn,
    Reconciling,
    Notifying,
    Done,
    Failed,
}

impl SyncStage {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStage::Validating => "VALIDATING",
            SyncStage::MappingOut => "MAPPING_OUT",
            SyncStage::RemoteCall => "REMOTE_CALL",
            SyncStage::MappingIn => "MAPPING_IN",
            SyncStage::Reconciling => "RECONCILING",
            SyncStage::Notifying => "NOTIFYING",
            SyncStage::Done => "DONE",
            SyncStage::Failed => "FAILED",
        }
    }

    /// Step that follows on success.
    #[must_use]
    pub fn next(&self) -> Option<SyncStage> {
        match self {
            SyncStage::Validating => Some(SyncStage::MappingOut),
            SyncStage::MappingOut => Some(SyncStage::RemoteCall),
            SyncStage::RemoteCall => Some(SyncStage::MappingIn),
            SyncStage::MappingIn => Some(SyncStage::Reconciling),
            SyncStage::Reconciling => Some(SyncStage::Notifying),
            SyncStage::Notifying => Some(SyncStage::Done),
            SyncStage::Done | SyncStage::Failed => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStage::Done | SyncStage::Failed)
    }

    /// Check if a transition from this stage to another is valid.
    #[must_use]
    pub fn can_transition_to(&self, target: SyncStage) -> bool {
        match (self, target) {
            (from, SyncStage::Failed) => !from.is_terminal(),
            (from, to) => from.next() == Some(to),
        }
    }

    /// Whether the provider may already hold the object once this step is
    /// reached.
    #[must_use]
    pub fn has_reached_remote(&self) -> bool {
        matches!(
            self,
            SyncStage::RemoteCall | SyncStage::MappingIn | SyncStage::Reconciling | SyncStage::Notifying
        )
    }
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDER: [SyncStage; 7] = [
        SyncStage::Validating,
        SyncStage::MappingOut,
        SyncStage::RemoteCall,
        SyncStage::MappingIn,
        SyncStage::Reconciling,
        SyncStage::Notifying,
        SyncStage::Done,
    ];

    #[test]
    fn test_stages_advance_in_order() {
        for pair in ORDER.windows(2) {
            assert_eq!(pair[0].next(), Some(pair[1]));
            assert!(pair[0].can_transition_to(pair[1]));
            assert!(!pair[1].can_transition_to(pair[0]));
        }
        assert!(!SyncStage::Validating.can_transition_to(SyncStage::RemoteCall));
    }

    #[test]
    fn test_failed_is_absorbing() {
        for stage in &ORDER[..6] {
            assert!(stage.can_transition_to(SyncStage::Failed));
        }
        assert!(!SyncStage::Done.can_transition_to(SyncStage::Failed));
        assert!(!SyncStage::Failed.can_transition_to(SyncStage::Failed));
        assert_eq!(SyncStage::Failed.next(), None);
    }

    #[test]
    fn test_display_and_serde_agree() {
        assert_eq!(SyncStage::MappingOut.to_string(), "MAPPING_OUT");
        assert_eq!(
            serde_json::to_value(SyncStage::RemoteCall).unwrap(),
            serde_json::json!("REMOTE_CALL")
        );
    }
}
