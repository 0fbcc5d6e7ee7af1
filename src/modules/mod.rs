//! Modules layer - infrastructure clients for external services
//!
//! Object storage for study documents and the external scoring job webhook.

pub mod scoring;
pub mod storage;
