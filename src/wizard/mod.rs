//! Step-wizard engine — drives every multi-step flow in the product.
//!
//! A flow is an ordered set of steps keyed by [`StepId`]. The engine keeps the
//! current position, the accumulated field values and the last validation
//! errors, and moves forward (validated), backward or directly to a step.
//! Addresses are never parsed here: callers hand in an already-extracted step
//! id and receive navigation requests through a [`Navigator`].

pub mod controller;
pub mod flows;
pub mod state;
pub mod step;
pub mod validation;

pub use controller::{
    NavigationRequest, Navigator, NoopNavigator, RecordingNavigator, WizardController,
};
pub use flows::Flow;
pub use state::{ErrorMap, Fields, NoValidation, StepValidator, Transition, WizardState};
pub use step::{StepDescriptor, StepId};
