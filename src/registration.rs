//! Registration flow — the sign-up wizard wired to the approval store.
//!
//! Steps: 3.0 account details, 3.1 company and role, 3.2 review. Submitting
//! creates the account; admins are signed in, everyone else waits for their
//! company admin.

use rust_decimal_macros::dec;
use serde_json::Value;
use tracing::{debug, info};

use crate::approval::{CurrentUser, NewCredential, Role};
use crate::error::{Error, WizardError};
use crate::session::Session;
use crate::wizard::validation::{require, require_email, text};
use crate::wizard::{ErrorMap, Fields, Flow, Navigator, StepId, Transition, WizardController};

const MIN_PASSWORD_LEN: usize = 6;

/// Field checks for one registration step.
pub fn validate_step(step: StepId, fields: &Fields) -> ErrorMap {
    let mut errors = ErrorMap::new();

    if step.value() == dec!(3.0) {
        require(&mut errors, fields, "first_name", "First name is required");
        require(&mut errors, fields, "last_name", "Last name is required");
        require_email(
            &mut errors,
            fields,
            "email",
            "Email is required",
            "Enter a valid email address",
        );

        let password = text(fields, "password");
        if require(&mut errors, fields, "password", "Password is required")
            && password.chars().count() < MIN_PASSWORD_LEN
        {
            errors.insert(
                "password".into(),
                "Password must be at least 6 characters".into(),
            );
        }
        if require(
            &mut errors,
            fields,
            "confirm_password",
            "Please confirm your password",
        ) && text(fields, "confirm_password") != password
        {
            errors.insert("confirm_password".into(), "Passwords do not match".into());
        }
    } else if step.value() == dec!(3.1) {
        match text(fields, "role").parse::<Role>() {
            Ok(role) if !role.is_admin() => {
                require(&mut errors, fields, "company", "Please enter your company name");
            }
            Ok(_) => {}
            Err(_) => {
                errors.insert("role".into(), "Select a role".into());
            }
        }
    }

    errors
}

/// What happened on submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Admin account, signed in straight away.
    SignedIn(CurrentUser),
    /// Account created; the company admin has to approve it first.
    AwaitingApproval { email: String, company: String },
}

/// A running registration.
pub struct RegistrationFlow<N: Navigator> {
    wizard: WizardController<N>,
    session: Session,
}

impl<N: Navigator> RegistrationFlow<N> {
    pub fn new(session: Session, start: Option<StepId>, navigator: N) -> Result<Self, WizardError> {
        Ok(Self {
            wizard: WizardController::for_flow(Flow::Registration, start, navigator)?,
            session,
        })
    }

    pub fn wizard(&self) -> &WizardController<N> {
        &self.wizard
    }

    pub fn update_field(&mut self, key: impl Into<String>, value: Value) {
        self.wizard.update_field(key, value);
    }

    pub fn next(&mut self) -> Result<Transition, WizardError> {
        self.wizard.advance(&Flow::Registration)
    }

    pub fn back(&mut self) -> Transition {
        self.wizard.retreat()
    }

    /// Create the account from the collected fields.
    ///
    /// Every step is re-checked first, since indicator jumps skip validation.
    /// The first failing step becomes current and carries the errors.
    pub fn submit(&mut self) -> Result<RegistrationOutcome, Error> {
        let steps: Vec<StepId> = self.wizard.state().steps().iter().map(|s| s.id).collect();
        for step in steps {
            if !Flow::Registration
                .validate(step, self.wizard.state().fields())
                .is_empty()
            {
                debug!(step = %step, "Registration submit blocked");
                self.wizard.jump_to(step)?;
                self.wizard.advance(&Flow::Registration)?;
            }
        }

        let fields = self.wizard.state().fields();
        // Checked by the company step above.
        let role = text(fields, "role").parse::<Role>().unwrap_or(Role::Other);
        let new = NewCredential {
            email: text(fields, "email").trim().to_string(),
            password: text(fields, "password"),
            first_name: text(fields, "first_name"),
            last_name: text(fields, "last_name"),
            company: text(fields, "company"),
            role,
        };

        let credential = self.session.approvals().register(new)?;
        if credential.role.is_admin() {
            let user = self.session.start(&credential)?;
            info!(email = %user.email, "Registration complete, signed in");
            Ok(RegistrationOutcome::SignedIn(user))
        } else {
            Ok(RegistrationOutcome::AwaitingApproval {
                email: credential.email,
                company: credential.company,
            })
        }
    }
}
