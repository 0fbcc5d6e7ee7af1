pub mod document_handler;
pub mod lifecycle_handler;
pub mod study_handler;
pub mod webhook_handler;
