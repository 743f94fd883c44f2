//! Address handling for flows: `/<flow base>/<step id>`.

use tracing::debug;

use crate::wizard::{Flow, NavigationRequest, Navigator, StepId};

/// Step id encoded in `path` under `base`.
///
/// `None` when the path belongs to another flow, has no step segment, or the
/// segment is not a number.
pub fn step_from_path(path: &str, base: &str) -> Option<StepId> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let rest = path
        .trim_start_matches('/')
        .strip_prefix(base.trim_matches('/'))?
        .strip_prefix('/')?;
    let segment = rest.trim_end_matches('/');
    if segment.contains('/') {
        return None;
    }
    segment.parse().ok()
}

pub fn path_for(base: &str, step: StepId) -> String {
    format!("/{}/{}", base.trim_matches('/'), step)
}

/// In-memory address bar: follows navigation requests so the current step can
/// be read back when a flow is resumed.
#[derive(Debug, Clone, Default)]
pub struct AddressBar {
    path: String,
}

impl AddressBar {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The step `flow` should resume at, if the address names one.
    pub fn current_step(&self, flow: Flow) -> Option<StepId> {
        step_from_path(&self.path, flow.base())
    }
}

impl Navigator for AddressBar {
    fn navigate(&mut self, request: NavigationRequest) {
        self.path = path_for(&request.flow_base, request.step);
        debug!(path = %self.path, "Address updated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::{NoValidation, WizardController};

    fn sid(s: &str) -> StepId {
        s.parse().unwrap()
    }

    #[test]
    fn parses_step_segment() {
        assert_eq!(step_from_path("/forgot-password/27.2", "forgot-password"), Some(sid("27.2")));
        assert_eq!(
            step_from_path("/dashboard/add-product/21/", "dashboard/add-product"),
            Some(sid("21"))
        );
        assert_eq!(step_from_path("/onboarding/1.0?ref=mail", "onboarding"), Some(sid("1.0")));
    }

    #[test]
    fn unusable_paths_give_none() {
        assert_eq!(step_from_path("/forgot-password", "forgot-password"), None);
        assert_eq!(step_from_path("/forgot-password/", "forgot-password"), None);
        assert_eq!(step_from_path("/forgot-password/abc", "forgot-password"), None);
        assert_eq!(step_from_path("/forgot-passwords/27", "forgot-password"), None);
        assert_eq!(step_from_path("/register/3.0/extra", "register"), None);
        assert_eq!(step_from_path("", "register"), None);
    }

    #[test]
    fn formats_paths_with_declared_scale() {
        assert_eq!(path_for("onboarding", sid("2.0")), "/onboarding/2.0");
        assert_eq!(path_for("/dashboard/reports/", sid("25.1")), "/dashboard/reports/25.1");
    }

    #[test]
    fn address_bar_tracks_the_controller() {
        let bar = AddressBar::new("/forgot-password/27.1");
        let start = bar.current_step(Flow::ForgotPassword);
        let mut c = WizardController::for_flow(Flow::ForgotPassword, start, bar).unwrap();
        assert_eq!(c.current(), sid("27.1"));

        c.advance(&NoValidation).unwrap();
        assert_eq!(c.navigator().path(), "/forgot-password/27.2");
        assert_eq!(c.navigator().current_step(Flow::ForgotPassword), Some(sid("27.2")));
        assert_eq!(c.navigator().current_step(Flow::Reports), None);
    }

    #[test]
    fn unknown_step_in_address_falls_back_to_first() {
        let bar = AddressBar::new("/dashboard/reports/99");
        let start = bar.current_step(Flow::Reports);
        let c = WizardController::for_flow(Flow::Reports, start, bar).unwrap();
        assert_eq!(c.current(), sid("25"));
    }
}
