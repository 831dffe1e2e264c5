//! Workflow stage state machine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::case::IntakeFields;
use crate::error::{CaseError, Result};

/// The active view of the case, in workflow order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Stage {
    #[default]
    Intake,
    Analyzing,
    Investigation,
    Evidence,
    Strategy,
    Conference,
    Letter,
}

impl Stage {
    pub fn all() -> Vec<Stage> {
        Stage::iter().collect()
    }

    /// Stages reachable freely once an analysis exists.
    pub fn is_workspace_tab(self) -> bool {
        matches!(
            self,
            Stage::Investigation
                | Stage::Evidence
                | Stage::Strategy
                | Stage::Conference
                | Stage::Letter
        )
    }
}

/// Drives legal transitions between stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageController {
    stage: Stage,
    has_analysis: bool,
}

impl StageController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a saved stage.
    ///
    /// `analyzing` resumes as `intake` since no call survives a reload, and
    /// workspace tabs require an analysis.
    pub fn resume(saved: Stage, has_analysis: bool) -> Self {
        let stage = match saved {
            Stage::Analyzing => Stage::Intake,
            tab if tab.is_workspace_tab() && !has_analysis => Stage::Intake,
            other => other,
        };
        if stage != saved {
            tracing::info!(saved = %saved, resumed = %stage, "Adjusted resumed stage");
        }
        Self {
            stage,
            has_analysis,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn has_analysis(&self) -> bool {
        self.has_analysis
    }

    pub fn is_analyzing(&self) -> bool {
        self.stage == Stage::Analyzing
    }

    /// Enters `analyzing`.
    ///
    /// Rejected with [`CaseError::AnalysisInFlight`] while already analyzing
    /// and with a validation error when there is no intake text.
    pub fn begin_analysis(&mut self, intake: &IntakeFields) -> Result<()> {
        if self.is_analyzing() {
            return Err(CaseError::AnalysisInFlight);
        }
        if intake.is_blank() {
            return Err(CaseError::validation(
                "intake.complaint",
                "must not be empty before analysis",
            ));
        }
        self.transition(Stage::Analyzing);
        Ok(())
    }

    pub fn analysis_succeeded(&mut self) -> Result<()> {
        self.require_analyzing(Stage::Investigation)?;
        self.has_analysis = true;
        self.transition(Stage::Investigation);
        Ok(())
    }

    /// Falls back to `intake`. Intake text is owned by the case and is left as is.
    pub fn analysis_failed(&mut self) -> Result<()> {
        self.require_analyzing(Stage::Intake)?;
        self.transition(Stage::Intake);
        Ok(())
    }

    /// Switches between workspace tabs.
    pub fn navigate(&mut self, to: Stage) -> Result<()> {
        if !to.is_workspace_tab() || !self.has_analysis || self.is_analyzing() {
            return Err(self.invalid(to));
        }
        self.transition(to);
        Ok(())
    }

    pub fn reset(&mut self) {
        self.has_analysis = false;
        self.transition(Stage::Intake);
    }

    fn require_analyzing(&self, to: Stage) -> Result<()> {
        if self.is_analyzing() {
            Ok(())
        } else {
            Err(self.invalid(to))
        }
    }

    fn invalid(&self, to: Stage) -> CaseError {
        CaseError::InvalidTransition {
            from: self.stage.to_string(),
            to: to.to_string(),
        }
    }

    fn transition(&mut self, to: Stage) {
        if self.stage != to {
            tracing::debug!(from = %self.stage, to = %to, "Stage transition");
        }
        self.stage = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intake(text: &str) -> IntakeFields {
        IntakeFields {
            complaint: text.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_stage_order_and_names() {
        assert_eq!(Stage::all().first(), Some(&Stage::Intake));
        assert_eq!(Stage::all().last(), Some(&Stage::Letter));
        assert_eq!(Stage::Investigation.to_string(), "investigation");
        assert_eq!("conference".parse::<Stage>().unwrap(), Stage::Conference);
        assert!(Stage::Evidence > Stage::Analyzing);
    }

    #[test]
    fn test_blank_intake_blocks_analysis() {
        let mut controller = StageController::new();
        let err = controller.begin_analysis(&intake("   ")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(controller.stage(), Stage::Intake);
    }

    #[test]
    fn test_second_analyze_is_rejected() {
        let mut controller = StageController::new();
        controller.begin_analysis(&intake("X")).unwrap();
        let err = controller.begin_analysis(&intake("X")).unwrap_err();
        assert!(matches!(err, CaseError::AnalysisInFlight));
        assert_eq!(controller.stage(), Stage::Analyzing);
    }

    #[test]
    fn test_success_unlocks_tabs() {
        let mut controller = StageController::new();
        assert!(controller.navigate(Stage::Evidence).is_err());

        controller.begin_analysis(&intake("X")).unwrap();
        controller.analysis_succeeded().unwrap();
        assert_eq!(controller.stage(), Stage::Investigation);

        controller.navigate(Stage::Conference).unwrap();
        controller.navigate(Stage::Evidence).unwrap();
        assert_eq!(controller.stage(), Stage::Evidence);
        assert!(controller.navigate(Stage::Intake).is_err());
        assert!(controller.navigate(Stage::Analyzing).is_err());
    }

    #[test]
    fn test_failure_returns_to_intake() {
        let mut controller = StageController::new();
        controller.begin_analysis(&intake("X")).unwrap();
        controller.analysis_failed().unwrap();
        assert_eq!(controller.stage(), Stage::Intake);
        assert!(!controller.has_analysis());
        assert!(controller.analysis_failed().is_err());
    }

    #[test]
    fn test_reset_from_any_stage() {
        let mut controller = StageController::resume(Stage::Strategy, true);
        controller.reset();
        assert_eq!(controller.stage(), Stage::Intake);
        assert!(!controller.has_analysis());
    }

    #[test]
    fn test_resume_adjusts_unresumable_stages() {
        assert_eq!(StageController::resume(Stage::Analyzing, true).stage(), Stage::Intake);
        assert_eq!(StageController::resume(Stage::Letter, false).stage(), Stage::Intake);
        assert_eq!(StageController::resume(Stage::Letter, true).stage(), Stage::Letter);
    }
}
