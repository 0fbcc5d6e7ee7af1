//! Study lifecycle: the status transition table, per-study scoring job
//! handles and the controller enacting both.

mod controller;
mod jobs;
mod state_machine;

pub use controller::{CancelledJob, LifecycleController, StartedJob};
pub use jobs::{JobHandle, JobRegistry};
pub use state_machine::{authorize, Actor, InvalidTransition, StudyAction};
