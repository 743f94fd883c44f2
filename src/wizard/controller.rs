//! WizardController — binds a [`WizardState`] to a flow base and forwards every
//! position change to the routing collaborator.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::WizardError;

use super::flows::Flow;
use super::state::{StepValidator, Transition, WizardState};
use super::step::{StepDescriptor, StepId};

/// Request to show `/<flow_base>/<step>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub flow_base: String,
    pub step: StepId,
}

/// Routing collaborator: receives the new position after every move so the
/// address can reflect it.
pub trait Navigator {
    fn navigate(&mut self, request: NavigationRequest);
}

/// Navigator that drops every request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&mut self, _request: NavigationRequest) {}
}

/// Navigator that keeps every request, newest last.
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    pub requests: Vec<NavigationRequest>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&NavigationRequest> {
        self.requests.last()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, request: NavigationRequest) {
        self.requests.push(request);
    }
}

/// Drives one running flow.
pub struct WizardController<N: Navigator> {
    base: String,
    state: WizardState,
    navigator: N,
}

impl<N: Navigator> WizardController<N> {
    pub fn new(
        base: impl Into<String>,
        steps: Vec<StepDescriptor>,
        start: Option<StepId>,
        navigator: N,
    ) -> Result<Self, WizardError> {
        let base = base.into();
        let state = WizardState::new(steps, start)?;
        debug!(flow = %base, step = %state.current(), "Flow started");
        Ok(Self {
            base,
            state,
            navigator,
        })
    }

    /// Start one of the catalog flows.
    pub fn for_flow(flow: Flow, start: Option<StepId>, navigator: N) -> Result<Self, WizardError> {
        Self::new(flow.base(), flow.steps(), start, navigator)
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn current(&self) -> StepId {
        self.state.current()
    }

    /// Validate and move forward. See [`WizardState::advance`].
    pub fn advance<V>(&mut self, validator: &V) -> Result<Transition, WizardError>
    where
        V: StepValidator + ?Sized,
    {
        let transition = self.state.advance(validator).inspect_err(|e| {
            debug!(flow = %self.base, step = %self.state.current(), error = %e, "Advance blocked");
        })?;
        self.emit(transition);
        Ok(transition)
    }

    /// Move back one step without validating.
    pub fn retreat(&mut self) -> Transition {
        let transition = self.state.retreat();
        self.emit(transition);
        transition
    }

    /// Jump straight to `target` (step indicator click).
    pub fn jump_to(&mut self, target: StepId) -> Result<Transition, WizardError> {
        let transition = self.state.jump_to(target).inspect_err(|_| {
            warn!(flow = %self.base, target = %target, "Jump to unknown step ignored");
        })?;
        self.emit(transition);
        Ok(transition)
    }

    pub fn update_field(&mut self, key: impl Into<String>, value: Value) {
        self.state.update_field(key, value);
    }

    /// Finish the flow and take its state.
    pub fn into_state(self) -> WizardState {
        self.state
    }

    fn emit(&mut self, transition: Transition) {
        if !transition.moved() {
            return;
        }
        info!(flow = %self.base, from = %transition.from, to = %transition.to, "Step changed");
        self.navigator.navigate(NavigationRequest {
            flow_base: self.base.clone(),
            step: transition.to,
        });
    }
}
