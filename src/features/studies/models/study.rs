use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{AnalysisData, Questionnaire, ReputationData};
use crate::features::auth::model::AuthenticatedUser;
use crate::shared::constants::STANDARD_DOCUMENT_SLOTS;

/// Lifecycle status of a credit study
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum StudyStatus {
    Draft,
    Uploaded,
    Processing,
    PendingReview,
    Corrected,
    Approved,
    Rejected,
}

impl StudyStatus {
    pub const ALL: [StudyStatus; 7] = [
        StudyStatus::Draft,
        StudyStatus::Uploaded,
        StudyStatus::Processing,
        StudyStatus::PendingReview,
        StudyStatus::Corrected,
        StudyStatus::Approved,
        StudyStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StudyStatus::Draft => "draft",
            StudyStatus::Uploaded => "uploaded",
            StudyStatus::Processing => "processing",
            StudyStatus::PendingReview => "pending_review",
            StudyStatus::Corrected => "corrected",
            StudyStatus::Approved => "approved",
            StudyStatus::Rejected => "rejected",
        }
    }
}

impl std::fmt::Display for StudyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StudyStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown study status '{}'", s))
    }
}

/// Document body of a study: everything except identity and lifecycle columns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudyDocument {
    #[serde(default)]
    pub empresa_nombre: String,
    #[serde(default)]
    pub rfc: String,
    #[serde(default)]
    pub giro: String,
    #[serde(default)]
    pub questionnaire: Questionnaire,
    /// Document slot name to storage locator
    #[serde(default)]
    pub files: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_data: Option<AnalysisData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation_data: Option<ReputationData>,
}

impl StudyDocument {
    /// Empty document with every standard slot present and unset
    pub fn with_standard_slots() -> Self {
        Self {
            files: STANDARD_DOCUMENT_SLOTS
                .iter()
                .map(|slot| (slot.to_string(), None))
                .collect(),
            ..Default::default()
        }
    }
}

/// One credit-analysis case. `id` is absent until the first save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub owner_uid: String,
    pub status: StudyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub document: StudyDocument,
}

impl Study {
    /// In-memory draft owned by `owner_uid`, not yet persisted
    pub fn draft(owner_uid: &str) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            owner_uid: owner_uid.to_string(),
            status: StudyStatus::Draft,
            created_at: now,
            updated_at: now,
            document: StudyDocument::with_standard_slots(),
        }
    }

    pub fn is_owned_by(&self, uid: &str) -> bool {
        self.owner_uid == uid
    }

    /// Reviewers and admins see every study; requesters only their own
    pub fn is_visible_to(&self, user: &AuthenticatedUser) -> bool {
        user.can_review() || self.is_owned_by(&user.sub)
    }
}
