use crate::types::StepEventStatus;

/// Display color of one matrix cell.
///
/// The compound variants (`FailureSuccess`, `SuccessMissing`, ...) describe a
/// history: the first half is what happened before, the second half is the
/// latest state. They are only shown when previous run states are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusColor {
    Success,
    Failure,
    Skipped,
    InProgress,
    Missing,
    /// Failed in an earlier run, succeeded in the latest one.
    FailureSuccess,
    /// Failed in an earlier run, skipped in the latest one.
    FailureSkipped,
    /// Last settled outcome was a failure; the latest run did not run the step.
    FailureMissing,
    SuccessMissing,
    SkippedMissing,
}

impl StatusColor {
    pub const ALL: [StatusColor; 10] = [
        StatusColor::Success,
        StatusColor::Failure,
        StatusColor::Skipped,
        StatusColor::InProgress,
        StatusColor::Missing,
        StatusColor::FailureSuccess,
        StatusColor::FailureSkipped,
        StatusColor::FailureMissing,
        StatusColor::SuccessMissing,
        StatusColor::SkippedMissing,
    ];

    /// Color of a single recorded status.
    pub fn for_status(status: Option<StepEventStatus>) -> Self {
        match status {
            Some(StepEventStatus::Success) => Self::Success,
            Some(StepEventStatus::Failure) => Self::Failure,
            Some(StepEventStatus::Skipped) => Self::Skipped,
            Some(StepEventStatus::InProgress) => Self::InProgress,
            Some(StepEventStatus::Unknown) | None => Self::Missing,
        }
    }

    /// Collapse a history color down to the latest outcome.
    pub fn final_color(self) -> Self {
        match self {
            Self::Success | Self::FailureSuccess | Self::SuccessMissing => Self::Success,
            Self::Failure | Self::FailureMissing => Self::Failure,
            Self::Skipped | Self::FailureSkipped | Self::SkippedMissing => Self::Skipped,
            Self::InProgress => Self::InProgress,
            Self::Missing => Self::Missing,
        }
    }

    /// Color for a step's status history, oldest run first.
    ///
    /// `None` entries are runs that have no record for the step. With
    /// `show_previous` unset the result is always a final color.
    pub fn from_history(statuses: &[Option<StepEventStatus>], show_previous: bool) -> Self {
        let composite = Self::composite(statuses);
        if show_previous {
            composite
        } else {
            composite.final_color()
        }
    }

    fn composite(statuses: &[Option<StepEventStatus>]) -> Self {
        let Some((latest, earlier)) = statuses.split_last() else {
            return Self::Missing;
        };
        let failed_before = earlier.contains(&Some(StepEventStatus::Failure));

        match Self::for_status(*latest) {
            Self::Success if failed_before => Self::FailureSuccess,
            Self::Skipped if failed_before => Self::FailureSkipped,
            Self::Missing => {
                let settled = earlier.iter().rev().find_map(|s| match s {
                    Some(
                        status @ (StepEventStatus::Success
                        | StepEventStatus::Failure
                        | StepEventStatus::Skipped),
                    ) => Some(*status),
                    _ => None,
                });
                match settled {
                    Some(StepEventStatus::Failure) => Self::FailureMissing,
                    Some(StepEventStatus::Success) => Self::SuccessMissing,
                    Some(StepEventStatus::Skipped) => Self::SkippedMissing,
                    _ => Self::Missing,
                }
            }
            color => color,
        }
    }

    /// True when any run in the history failed.
    pub fn has_failure(self) -> bool {
        matches!(
            self,
            Self::Failure | Self::FailureSuccess | Self::FailureSkipped | Self::FailureMissing
        )
    }

    /// True when the latest run left the step without a record.
    pub fn is_gap(self) -> bool {
        matches!(
            self,
            Self::Missing | Self::FailureMissing | Self::SuccessMissing | Self::SkippedMissing
        )
    }

    pub fn is_clean_success(self) -> bool {
        self == Self::Success
    }

    /// No run ever recorded the step.
    pub fn is_empty(self) -> bool {
        self == Self::Missing
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Success => "Succeeded",
            Self::Failure => "Failed",
            Self::Skipped => "Skipped",
            Self::InProgress => "In progress",
            Self::Missing => "Not run",
            Self::FailureSuccess => "Succeeded after failure",
            Self::FailureSkipped => "Skipped after failure",
            Self::FailureMissing => "Failed, then not run",
            Self::SuccessMissing => "Succeeded, then not run",
            Self::SkippedMissing => "Skipped, then not run",
        }
    }
}
