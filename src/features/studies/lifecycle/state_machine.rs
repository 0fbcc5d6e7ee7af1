use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::studies::models::StudyStatus;

/// Requested change to a study's status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StudyAction {
    /// Requester finalizes the intake
    Submit,
    StartScoring,
    /// Job failed, was cancelled, or an explicit reset
    Reset,
    /// External completion signal from the scoring job
    CompleteScoring,
    Approve,
    Reject,
}

impl StudyAction {
    #[cfg(test)]
    pub const ALL: [StudyAction; 6] = [
        StudyAction::Submit,
        StudyAction::StartScoring,
        StudyAction::Reset,
        StudyAction::CompleteScoring,
        StudyAction::Approve,
        StudyAction::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyAction::Submit => "submit",
            StudyAction::StartScoring => "start scoring",
            StudyAction::Reset => "reset",
            StudyAction::CompleteScoring => "complete scoring",
            StudyAction::Approve => "approve",
            StudyAction::Reject => "reject",
        }
    }

    /// Statuses this action may be applied from
    pub fn sources(&self) -> &'static [StudyStatus] {
        match self {
            StudyAction::Submit => &[StudyStatus::Draft],
            StudyAction::StartScoring => &[StudyStatus::Draft, StudyStatus::Uploaded],
            StudyAction::Reset | StudyAction::CompleteScoring => &[StudyStatus::Processing],
            StudyAction::Approve | StudyAction::Reject => {
                &[StudyStatus::PendingReview, StudyStatus::Corrected]
            }
        }
    }

    pub fn target(&self) -> StudyStatus {
        match self {
            StudyAction::Submit => StudyStatus::Uploaded,
            StudyAction::StartScoring => StudyStatus::Processing,
            StudyAction::Reset => StudyStatus::Draft,
            StudyAction::CompleteScoring => StudyStatus::PendingReview,
            StudyAction::Approve => StudyStatus::Approved,
            StudyAction::Reject => StudyStatus::Rejected,
        }
    }
}

impl std::fmt::Display for StudyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} a study in status '{from}'")]
pub struct InvalidTransition {
    pub from: StudyStatus,
    pub action: StudyAction,
}

impl From<InvalidTransition> for AppError {
    fn from(e: InvalidTransition) -> Self {
        AppError::InvalidTransition {
            status: e.from.to_string(),
            action: e.action.to_string(),
        }
    }
}

impl StudyStatus {
    /// Resulting status of `action`, or the transition error naming both
    pub fn apply(self, action: StudyAction) -> Result<StudyStatus, InvalidTransition> {
        if action.sources().contains(&self) {
            Ok(action.target())
        } else {
            Err(InvalidTransition { from: self, action })
        }
    }
}

/// Who is asking for a transition
#[derive(Debug, Clone, Copy)]
pub enum Actor<'a> {
    User(&'a AuthenticatedUser),
    /// The controller rolling back its own failed job
    Controller,
    /// The scoring job reporting completion
    ScoringService,
}

/// Check that `actor` may perform `action` on a study owned by `owner_uid`
pub fn authorize(action: StudyAction, actor: Actor<'_>, owner_uid: &str) -> Result<(), AppError> {
    let allowed = match (action, actor) {
        (StudyAction::Submit, Actor::User(user)) => user.sub == owner_uid,
        (StudyAction::StartScoring | StudyAction::Approve | StudyAction::Reject, Actor::User(user)) => {
            user.can_review()
        }
        (StudyAction::Reset, Actor::User(user)) => user.can_review(),
        (StudyAction::Reset, Actor::Controller) => true,
        (StudyAction::CompleteScoring, Actor::ScoringService) => true,
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::NotAuthorized(format!(
            "Not allowed to {} this study",
            action
        )))
    }
}
