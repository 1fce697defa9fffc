//! Approval stages for timesheets and expense reports.
//!
//! A transition is validated here before it reaches the database, and the
//! database write is conditional on the status the caller last saw (see
//! `Database::apply_timesheet_action`). A concurrent change is reported as
//! [`WorkflowError::Conflict`] instead of being silently overwritten.

use crate::models::{ApprovalStatus, Role, User};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalAction {
    Submit,
    Approve,
    Reject(String),
}

impl ApprovalAction {
    pub fn name(&self) -> &'static str {
        match self {
            ApprovalAction::Submit => "submit",
            ApprovalAction::Approve => "approve",
            ApprovalAction::Reject(_) => "reject",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("cannot {action} an item that is {from}")]
    InvalidTransition { from: ApprovalStatus, action: &'static str },
    #[error("{0} is not allowed to perform this action")]
    NotPermitted(String),
    #[error("nothing to submit: add at least one line first")]
    EmptySubmission,
    #[error("a rejection needs a reason")]
    MissingReason,
    #[error("item was changed by someone else; reload and try again")]
    Conflict,
}

/// Who owns an item and which client they bill to
#[derive(Debug, Clone, Copy)]
pub struct Ownership {
    pub owner_id: i32,
    pub client_id: Option<i32>,
}

/// Pure status arithmetic: where does `action` take an item that is `from`?
pub fn next_status(from: ApprovalStatus, action: &ApprovalAction) -> Result<ApprovalStatus, WorkflowError> {
    let invalid = || WorkflowError::InvalidTransition { from, action: action.name() };
    match action {
        ApprovalAction::Submit => match from {
            ApprovalStatus::Draft | ApprovalStatus::Rejected => Ok(ApprovalStatus::Submitted),
            _ => Err(invalid()),
        },
        ApprovalAction::Approve => match from {
            ApprovalStatus::Submitted => Ok(ApprovalStatus::ClientApproved),
            ApprovalStatus::ClientApproved => Ok(ApprovalStatus::PayrollApproved),
            _ => Err(invalid()),
        },
        ApprovalAction::Reject(reason) => {
            if reason.trim().is_empty() {
                return Err(WorkflowError::MissingReason);
            }
            match from {
                ApprovalStatus::Submitted | ApprovalStatus::ClientApproved => Ok(ApprovalStatus::Rejected),
                _ => Err(invalid()),
            }
        }
    }
}

/// Whether `actor` may move an item owned as described by `owner` from `from`.
pub fn can_act(actor: &User, owner: Ownership, from: ApprovalStatus, action: &ApprovalAction) -> bool {
    match action {
        ApprovalAction::Submit => actor.id == owner.owner_id,
        ApprovalAction::Approve | ApprovalAction::Reject(_) => match actor.role {
            Role::Admin => true,
            Role::Manager => {
                from == ApprovalStatus::Submitted
                    && actor.id != owner.owner_id
                    && actor.client_id.is_some()
                    && actor.client_id == owner.client_id
            }
            Role::Employee => false,
        },
    }
}

/// Validates a transition end to end. `line_count` is the number of time
/// entries or expense items attached to the item.
pub fn plan_transition(
    actor: &User,
    owner: Ownership,
    from: ApprovalStatus,
    action: &ApprovalAction,
    line_count: usize,
) -> Result<ApprovalStatus, WorkflowError> {
    let to = next_status(from, action)?;
    if !can_act(actor, owner, from, action) {
        return Err(WorkflowError::NotPermitted(actor.full_name.clone()));
    }
    if *action == ApprovalAction::Submit && line_count == 0 {
        return Err(WorkflowError::EmptySubmission);
    }
    Ok(to)
}
