//! Per-image action reports delivered to the host

use crate::Album;
use app_fs::MoveError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// What was attempted on an image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageAction {
    Move { album: Album },
    Skip,
    Trash,
}

/// How it went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Cursor advanced. `destination` is the image's new path when known.
    Success { destination: Option<PathBuf> },
    /// Destination already held a file with the same name
    Collision(PathBuf),
    /// Cross-volume copy failed verification; source untouched
    PartialMove(String),
    /// Trash pressed with no trash destination
    NotConfigured,
    /// Any other per-image failure
    Failed(String),
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Success { .. })
    }
}

impl From<&MoveError> for ActionOutcome {
    fn from(e: &MoveError) -> Self {
        match e {
            MoveError::Collision(path) => ActionOutcome::Collision(path.clone()),
            MoveError::PartialMove { reason, .. } => ActionOutcome::PartialMove(reason.clone()),
            MoveError::NotConfigured => ActionOutcome::NotConfigured,
            other => ActionOutcome::Failed(other.to_string()),
        }
    }
}

/// One resolved Move/Skip/Trash
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub image: PathBuf,
    pub action: ImageAction,
    pub outcome: ActionOutcome,
    /// Images left, including the current one
    pub remaining: usize,
    pub timestamp: DateTime<Utc>,
}

/// Receives a report for every resolved action, success or failure
pub trait DispatchObserver: Send {
    fn on_action(&mut self, report: &ActionReport);
}

impl<F> DispatchObserver for F
where
    F: FnMut(&ActionReport) + Send,
{
    fn on_action(&mut self, report: &ActionReport) {
        self(report)
    }
}

/// Observer that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl DispatchObserver for LogObserver {
    fn on_action(&mut self, report: &ActionReport) {
        if report.outcome.is_success() {
            tracing::info!(
                image = %report.image.display(),
                remaining = report.remaining,
                "{:?}",
                report.action
            );
        } else {
            tracing::warn!(
                image = %report.image.display(),
                remaining = report.remaining,
                "{:?} failed: {:?}",
                report.action,
                report.outcome
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_move_error() {
        let collision = MoveError::Collision(PathBuf::from("/albums/cats/a.jpg"));
        assert_eq!(
            ActionOutcome::from(&collision),
            ActionOutcome::Collision(PathBuf::from("/albums/cats/a.jpg"))
        );
        assert_eq!(
            ActionOutcome::from(&MoveError::NotConfigured),
            ActionOutcome::NotConfigured
        );
        assert!(matches!(
            ActionOutcome::from(&MoveError::PartialMove {
                image: PathBuf::from("a.jpg"),
                reason: "checksum mismatch".into(),
            }),
            ActionOutcome::PartialMove(_)
        ));
        assert!(matches!(
            ActionOutcome::from(&MoveError::NotFound(PathBuf::from("a.jpg"))),
            ActionOutcome::Failed(_)
        ));
    }
}
