//! Tagged-variant state machines shared by persistence and HTTP validation.
//!
//! Keeping `can_transition_stage`/`can_transition_status` pure and free of
//! any database access means a controller can reject an illegal transition
//! before touching storage, and the manager can reuse the same check inside
//! its transaction.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Applied,
    Screening,
    InterviewScheduled,
    InterviewCompleted,
    Hired,
    Rejected,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Applied => "APPLIED",
            Stage::Screening => "SCREENING",
            Stage::InterviewScheduled => "INTERVIEW_SCHEDULED",
            Stage::InterviewCompleted => "INTERVIEW_COMPLETED",
            Stage::Hired => "HIRED",
            Stage::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "APPLIED" => Some(Stage::Applied),
            "SCREENING" => Some(Stage::Screening),
            "INTERVIEW_SCHEDULED" => Some(Stage::InterviewScheduled),
            "INTERVIEW_COMPLETED" => Some(Stage::InterviewCompleted),
            "HIRED" => Some(Stage::Hired),
            "REJECTED" => Some(Stage::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Hired | Stage::Rejected)
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Allowed stage transitions per the pipeline manager's transition table.
/// Every transition not listed here is illegal, including self-transitions.
pub fn can_transition_stage(from: Stage, to: Stage) -> bool {
    use Stage::*;
    matches!(
        (from, to),
        (Applied, Screening)
            | (Applied, Rejected)
            | (Screening, InterviewScheduled)
            | (Screening, Rejected)
            | (InterviewScheduled, InterviewCompleted)
            | (InterviewScheduled, Rejected)
            | (InterviewCompleted, Hired)
            | (InterviewCompleted, Rejected)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterviewStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
    Rescheduled,
}

impl InterviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewStatus::Scheduled => "SCHEDULED",
            InterviewStatus::InProgress => "IN_PROGRESS",
            InterviewStatus::Completed => "COMPLETED",
            InterviewStatus::Cancelled => "CANCELLED",
            InterviewStatus::Rescheduled => "RESCHEDULED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(InterviewStatus::Scheduled),
            "IN_PROGRESS" => Some(InterviewStatus::InProgress),
            "COMPLETED" => Some(InterviewStatus::Completed),
            "CANCELLED" => Some(InterviewStatus::Cancelled),
            "RESCHEDULED" => Some(InterviewStatus::Rescheduled),
            _ => None,
        }
    }

    /// CANCELLED/COMPLETED interviews are excluded from the overlap check.
    /// RESCHEDULED never persists as a resting value — `reschedule` writes it
    /// and immediately writes the synthetic return to SCHEDULED in the same
    /// transaction, so it is never seen by the overlap check either way.
    pub fn is_terminal(&self) -> bool {
        matches!(self, InterviewStatus::Completed | InterviewStatus::Cancelled)
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn can_transition_status(from: InterviewStatus, to: InterviewStatus) -> bool {
    use InterviewStatus::*;
    matches!(
        (from, to),
        (Scheduled, InProgress)
            | (Scheduled, Completed)
            | (Scheduled, Cancelled)
            | (Scheduled, Rescheduled)
            | (InProgress, Completed)
            | (InProgress, Cancelled)
            | (Rescheduled, Scheduled)
    )
}
