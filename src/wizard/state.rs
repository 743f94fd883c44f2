//! Wizard state — position, accumulated fields and validation errors for one
//! running flow.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::debug;

use crate::error::WizardError;

use super::step::{StepDescriptor, StepId};

/// Field values collected across the steps of a flow.
pub type Fields = serde_json::Map<String, Value>;

/// Field key → message for the last failed validation.
pub type ErrorMap = BTreeMap<String, String>;

/// Checks the fields of one step before the flow moves past it.
///
/// Implementations must be pure: no I/O, same answer for the same input.
pub trait StepValidator {
    fn validate(&self, step: StepId, fields: &Fields) -> ErrorMap;
}

impl<F> StepValidator for F
where
    F: Fn(StepId, &Fields) -> ErrorMap,
{
    fn validate(&self, step: StepId, fields: &Fields) -> ErrorMap {
        self(step, fields)
    }
}

/// Validator that accepts every step.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoValidation;

impl StepValidator for NoValidation {
    fn validate(&self, _step: StepId, _fields: &Fields) -> ErrorMap {
        ErrorMap::new()
    }
}

/// Outcome of a navigation call.
///
/// `from == to` means the call had nowhere to go: the first step for
/// `retreat`, the terminal step for `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: StepId,
    pub to: StepId,
}

impl Transition {
    pub fn moved(&self) -> bool {
        self.from != self.to
    }
}

/// State of one running flow.
#[derive(Debug, Clone)]
pub struct WizardState {
    /// Sorted by id, fixed for the lifetime of the flow.
    steps: Vec<StepDescriptor>,
    /// Always one of `steps[i].id`.
    current: StepId,
    fields: Fields,
    errors: ErrorMap,
}

impl WizardState {
    /// Start a flow at `start`, or at the first step when `start` is absent or
    /// not one of the flow's steps.
    pub fn new(
        mut steps: Vec<StepDescriptor>,
        start: Option<StepId>,
    ) -> Result<Self, WizardError> {
        steps.sort_by_key(|s| s.id);

        let first = steps.first().map(|s| s.id).ok_or(WizardError::EmptyFlow)?;
        if let Some(pair) = steps.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(WizardError::DuplicateStep { step: pair[1].id });
        }

        let current = match start {
            Some(requested) => match steps.iter().find(|s| s.id == requested) {
                Some(step) => step.id,
                None => {
                    debug!(
                        requested = %requested,
                        fallback = %first,
                        "Unknown start step, using first step"
                    );
                    first
                }
            },
            None => first,
        };

        Ok(Self {
            steps,
            current,
            fields: Fields::new(),
            errors: ErrorMap::new(),
        })
    }

    /// Start a flow from a raw step segment (e.g. taken from an address).
    /// Malformed or missing segments fall back to the first step.
    pub fn resume(steps: Vec<StepDescriptor>, raw: Option<&str>) -> Result<Self, WizardError> {
        let start = raw.and_then(|r| r.parse::<StepId>().ok());
        Self::new(steps, start)
    }

    pub fn current(&self) -> StepId {
        self.current
    }

    pub fn current_step(&self) -> &StepDescriptor {
        &self.steps[self.index()]
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    pub fn contains(&self, id: StepId) -> bool {
        self.steps.iter().any(|s| s.id == id)
    }

    /// Zero-based index of the current step.
    pub fn index(&self) -> usize {
        self.steps
            .iter()
            .position(|s| s.id == self.current)
            .unwrap_or(0)
    }

    /// `(step number, total)` for "Step 2 of 4" style indicators.
    pub fn position(&self) -> (usize, usize) {
        (self.index() + 1, self.steps.len())
    }

    pub fn is_first(&self) -> bool {
        self.index() == 0
    }

    pub fn is_last(&self) -> bool {
        self.index() + 1 == self.steps.len()
    }

    /// Share of the flow reached, including the current step, in percent.
    pub fn progress_percent(&self) -> u8 {
        let (number, total) = self.position();
        ((number * 100) / total) as u8
    }

    /// Smallest step id strictly greater than the current one.
    pub fn next_id(&self) -> Option<StepId> {
        self.steps.iter().map(|s| s.id).find(|id| *id > self.current)
    }

    /// Largest step id strictly less than the current one.
    pub fn prev_id(&self) -> Option<StepId> {
        self.steps.iter().rev().map(|s| s.id).find(|id| *id < self.current)
    }

    /// Validate the current step, then move to the next one.
    ///
    /// On failure the errors are replaced with the validator's report and the
    /// position is unchanged. On the terminal step a successful call stays put;
    /// running the flow's terminal action is up to the caller.
    pub fn advance<V>(&mut self, validator: &V) -> Result<Transition, WizardError>
    where
        V: StepValidator + ?Sized,
    {
        let errors = validator.validate(self.current, &self.fields);
        if !errors.is_empty() {
            self.errors = errors.clone();
            return Err(WizardError::ValidationFailed { errors });
        }

        let from = self.current;
        let to = self.next_id().unwrap_or(from);
        self.errors.clear();
        self.current = to;
        Ok(Transition { from, to })
    }

    /// Move to the previous step. Never validates; stays on the first step.
    pub fn retreat(&mut self) -> Transition {
        let from = self.current;
        let to = self.prev_id().unwrap_or(from);
        if to != from {
            self.errors.clear();
            self.current = to;
        }
        Transition { from, to }
    }

    /// Move directly to `target` without validating the step being left.
    pub fn jump_to(&mut self, target: StepId) -> Result<Transition, WizardError> {
        let to = self
            .steps
            .iter()
            .find(|s| s.id == target)
            .map(|s| s.id)
            .ok_or(WizardError::UnknownStep { step: target })?;

        let from = self.current;
        if to != from {
            self.errors.clear();
            self.current = to;
        }
        Ok(Transition { from, to })
    }

    /// Merge `value` into `fields[key]` and clear that field's error.
    ///
    /// Objects merge key by key (a section of a form updated one input at a
    /// time); any other value replaces what was there.
    pub fn update_field(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.fields.get_mut(&key) {
            Some(Value::Object(existing)) if value.is_object() => {
                if let Value::Object(incoming) = value {
                    existing.extend(incoming);
                }
            }
            _ => {
                self.fields.insert(key.clone(), value);
            }
        }
        self.errors.remove(&key);
    }

    /// Hand over the collected fields once the flow is done.
    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;

    fn sid(s: &str) -> StepId {
        s.parse().unwrap()
    }

    fn reset_password_steps() -> Vec<StepDescriptor> {
        vec![
            StepDescriptor::new(StepId::new(dec!(27)), "Enter Email"),
            StepDescriptor::new(StepId::new(dec!(27.1)), "Verify Code"),
            StepDescriptor::new(StepId::new(dec!(27.2)), "Reset Password"),
            StepDescriptor::new(StepId::new(dec!(27.3)), "Success"),
        ]
    }

    fn failing(key: &'static str) -> impl Fn(StepId, &Fields) -> ErrorMap {
        move |_, _| {
            let mut errors = ErrorMap::new();
            errors.insert(key.to_string(), format!("{key} is required"));
            errors
        }
    }

    #[test]
    fn sub_steps_advance_in_order_and_clamp() {
        let mut state = WizardState::new(reset_password_steps(), Some(sid("27"))).unwrap();

        for expected in ["27.1", "27.2", "27.3"] {
            let t = state.advance(&NoValidation).unwrap();
            assert!(t.moved());
            assert_eq!(state.current(), sid(expected));
        }

        let t = state.advance(&NoValidation).unwrap();
        assert!(!t.moved());
        assert_eq!(state.current(), sid("27.3"));
        assert!(state.is_last());
    }

    #[test]
    fn retreat_clamps_at_first_step() {
        let mut state = WizardState::new(reset_password_steps(), Some(sid("27.2"))).unwrap();
        assert_eq!(state.retreat().to, sid("27.1"));
        assert_eq!(state.retreat().to, sid("27"));

        let t = state.retreat();
        assert!(!t.moved());
        assert_eq!(state.current(), sid("27"));
        assert!(state.is_first());
    }

    #[test]
    fn steps_are_ordered_numerically_regardless_of_declaration() {
        let steps = vec![
            StepDescriptor::new(StepId::new(dec!(15.2)), "Permissions Setup"),
            StepDescriptor::new(StepId::whole(14), "Roles Overview"),
            StepDescriptor::new(StepId::new(dec!(15.1)), "Staff Management"),
            StepDescriptor::new(StepId::whole(15), "Create Role"),
        ];
        let mut state = WizardState::new(steps, None).unwrap();
        assert_eq!(state.current(), sid("14"));

        let mut visited = vec![state.current()];
        while state.advance(&NoValidation).unwrap().moved() {
            visited.push(state.current());
        }
        assert_eq!(visited, vec![sid("14"), sid("15"), sid("15.1"), sid("15.2")]);
    }

    #[test]
    fn unknown_or_malformed_start_falls_back_to_first() {
        let state = WizardState::new(reset_password_steps(), Some(sid("99"))).unwrap();
        assert_eq!(state.current(), sid("27"));

        let state = WizardState::resume(reset_password_steps(), Some("not-a-step")).unwrap();
        assert_eq!(state.current(), sid("27"));

        let state = WizardState::resume(reset_password_steps(), None).unwrap();
        assert_eq!(state.current(), sid("27"));

        let state = WizardState::resume(reset_password_steps(), Some("27.2")).unwrap();
        assert_eq!(state.current(), sid("27.2"));
    }

    #[test]
    fn resume_keeps_declared_scale() {
        let steps = vec![
            StepDescriptor::new(StepId::new(dec!(1.0)), "Welcome"),
            StepDescriptor::new(StepId::new(dec!(1.1)), "Business Info"),
        ];
        let state = WizardState::resume(steps, Some("1")).unwrap();
        assert_eq!(state.current().to_string(), "1.0");
    }

    #[test]
    fn empty_and_duplicate_flows_are_rejected() {
        assert!(matches!(WizardState::new(vec![], None), Err(WizardError::EmptyFlow)));

        let steps = vec![
            StepDescriptor::new(StepId::new(dec!(2.0)), "Goals"),
            StepDescriptor::new(StepId::whole(2), "Goals again"),
        ];
        assert!(matches!(
            WizardState::new(steps, None),
            Err(WizardError::DuplicateStep { .. })
        ));
    }

    #[test]
    fn failed_validation_keeps_position_and_reports_errors() {
        let mut state = WizardState::new(reset_password_steps(), None).unwrap();

        let err = state.advance(&failing("email")).unwrap_err();
        assert_eq!(state.current(), sid("27"));
        assert!(matches!(err, WizardError::ValidationFailed { .. }));
        assert_eq!(err.field_errors().unwrap().len(), 1);
        assert_eq!(
            state.errors().get("email").map(String::as_str),
            Some("email is required")
        );
    }

    #[test]
    fn validator_sees_current_step_and_fields() {
        let mut state = WizardState::new(reset_password_steps(), Some(sid("27.1"))).unwrap();
        state.update_field("verification_code", json!("123456"));

        let validator = |step: StepId, fields: &Fields| {
            let mut errors = ErrorMap::new();
            if step != sid("27.1") || fields.get("verification_code") != Some(&json!("123456")) {
                errors.insert("verification_code".into(), "unexpected input".into());
            }
            errors
        };
        assert_eq!(state.advance(&validator).unwrap().to, sid("27.2"));
    }

    #[test]
    fn successful_advance_clears_errors() {
        let mut state = WizardState::new(reset_password_steps(), None).unwrap();
        let _ = state.advance(&failing("email"));
        assert!(!state.errors().is_empty());

        state.advance(&NoValidation).unwrap();
        assert!(state.errors().is_empty());
    }

    #[test]
    fn edit_clears_only_its_own_error() {
        let mut state = WizardState::new(reset_password_steps(), Some(sid("27.2"))).unwrap();
        let both = |_: StepId, _: &Fields| {
            let mut errors = ErrorMap::new();
            errors.insert("new_password".into(), "New password is required".into());
            errors.insert("confirm_password".into(), "Passwords do not match".into());
            errors
        };
        let _ = state.advance(&both);
        assert_eq!(state.errors().len(), 2);

        state.update_field("new_password", json!("Secret123"));
        assert!(!state.errors().contains_key("new_password"));
        assert!(state.errors().contains_key("confirm_password"));
    }

    #[test]
    fn jump_skips_validation_and_rejects_unknown_targets() {
        let mut state = WizardState::new(reset_password_steps(), None).unwrap();
        let _ = state.advance(&failing("email"));

        let t = state.jump_to(sid("27.3")).unwrap();
        assert_eq!(t.from, sid("27"));
        assert_eq!(state.current(), sid("27.3"));
        assert!(state.errors().is_empty());

        let t = state.jump_to(sid("27.1")).unwrap();
        assert_eq!(t.to, sid("27.1"));

        let err = state.jump_to(sid("27.9")).unwrap_err();
        assert!(matches!(err, WizardError::UnknownStep { .. }));
        assert_eq!(state.current(), sid("27.1"));
    }

    #[test]
    fn fields_merge_and_accumulate() {
        let mut state = WizardState::new(reset_password_steps(), None).unwrap();
        state.update_field("email", json!("a@x.com"));
        state.update_field("pricing", json!({"cost_price": "4"}));
        state.update_field("pricing", json!({"selling_price": "9"}));
        state.advance(&NoValidation).unwrap();
        state.update_field("verification_code", json!("123456"));

        assert_eq!(state.field("email"), Some(&json!("a@x.com")));
        assert_eq!(
            state.field("pricing"),
            Some(&json!({"cost_price": "4", "selling_price": "9"}))
        );

        state.update_field("email", json!("b@x.com"));
        let fields = state.into_fields();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields["email"], json!("b@x.com"));
    }

    #[test]
    fn position_and_progress() {
        let mut state = WizardState::new(reset_password_steps(), None).unwrap();
        assert_eq!(state.position(), (1, 4));
        assert_eq!(state.progress_percent(), 25);
        assert_eq!(state.current_step().label, "Enter Email");
        assert_eq!(state.prev_id(), None);
        assert_eq!(state.next_id(), Some(sid("27.1")));

        state.jump_to(sid("27.3")).unwrap();
        assert_eq!(state.position(), (4, 4));
        assert_eq!(state.progress_percent(), 100);
        assert_eq!(state.next_id(), None);
        assert!(state.contains(sid("27.2")));
        assert!(!state.contains(sid("28")));
    }
}
