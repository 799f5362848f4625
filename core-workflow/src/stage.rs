//! Workflow stages
//!
//! The workflow is a linear three-step wizard. Forward moves go one stage at a
//! time; `back` goes exactly one stage backward.

use crate::error::{Result, WorkflowError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of an open workflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    /// Building and reviewing the selection
    #[default]
    Reviewing,
    /// Choosing the destination collection
    PickingDestination,
    /// Ready to submit the transfer
    Confirming,
}

impl WorkflowStage {
    /// All stages in order
    pub const ALL: [WorkflowStage; 3] = [
        WorkflowStage::Reviewing,
        WorkflowStage::PickingDestination,
        WorkflowStage::Confirming,
    ];

    pub fn next(&self) -> Option<WorkflowStage> {
        match self {
            WorkflowStage::Reviewing => Some(WorkflowStage::PickingDestination),
            WorkflowStage::PickingDestination => Some(WorkflowStage::Confirming),
            WorkflowStage::Confirming => None,
        }
    }

    pub fn previous(&self) -> Option<WorkflowStage> {
        match self {
            WorkflowStage::Reviewing => None,
            WorkflowStage::PickingDestination => Some(WorkflowStage::Reviewing),
            WorkflowStage::Confirming => Some(WorkflowStage::PickingDestination),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Reviewing => "reviewing",
            WorkflowStage::PickingDestination => "picking_destination",
            WorkflowStage::Confirming => "confirming",
        }
    }

    /// 1-based position for stepper display
    pub fn step(&self) -> usize {
        match self {
            WorkflowStage::Reviewing => 1,
            WorkflowStage::PickingDestination => 2,
            WorkflowStage::Confirming => 3,
        }
    }

    /// Stepper label
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStage::Reviewing => "Review selection",
            WorkflowStage::PickingDestination => "Choose destination",
            WorkflowStage::Confirming => "Confirm move",
        }
    }

    /// Check that moving from `self` to `to` is a single step forward or back
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Validation` for skips and self-transitions
    pub fn validate_transition(&self, to: WorkflowStage) -> Result<()> {
        let valid = match (*self, to) {
            (WorkflowStage::Reviewing, WorkflowStage::PickingDestination) => true,
            (WorkflowStage::PickingDestination, WorkflowStage::Confirming) => true,

            (WorkflowStage::PickingDestination, WorkflowStage::Reviewing) => true,
            (WorkflowStage::Confirming, WorkflowStage::PickingDestination) => true,

            _ => false,
        };

        if !valid {
            return Err(WorkflowError::Validation {
                stage: *self,
                reason: format!("cannot transition from {} to {}", self, to),
            });
        }

        Ok(())
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_order() {
        assert_eq!(
            WorkflowStage::Reviewing.next(),
            Some(WorkflowStage::PickingDestination)
        );
        assert_eq!(WorkflowStage::Confirming.next(), None);
        assert_eq!(WorkflowStage::Reviewing.previous(), None);

        for (index, stage) in WorkflowStage::ALL.iter().enumerate() {
            assert_eq!(stage.step(), index + 1);
        }
    }

    #[test]
    fn test_no_skipping() {
        assert!(WorkflowStage::Reviewing
            .validate_transition(WorkflowStage::Confirming)
            .is_err());
        assert!(WorkflowStage::Confirming
            .validate_transition(WorkflowStage::Reviewing)
            .is_err());
        assert!(WorkflowStage::Reviewing
            .validate_transition(WorkflowStage::Reviewing)
            .is_err());
    }

    #[test]
    fn test_single_steps_allowed() {
        for stage in WorkflowStage::ALL {
            if let Some(next) = stage.next() {
                assert!(stage.validate_transition(next).is_ok());
            }
            if let Some(previous) = stage.previous() {
                assert!(stage.validate_transition(previous).is_ok());
            }
        }
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&WorkflowStage::PickingDestination).unwrap();
        assert_eq!(json, "\"picking_destination\"");
        assert_eq!(WorkflowStage::PickingDestination.to_string(), "picking_destination");
        assert_eq!(WorkflowStage::Confirming.label(), "Confirm move");
    }
}
