//! Credit studies
//!
//! | Concern | Where |
//! |---|---|
//! | Intake, listing, questionnaire | `services::StudyService` |
//! | Documents | `services::DocumentService` + object storage |
//! | Status transitions and scoring jobs | `lifecycle::LifecycleController` |
//! | Reputation augmentation | `services::ReputationProvider` |
//! | Executive summary | `services::ReportService` |

pub mod dtos;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
