//! Flow catalog — the multi-step flows of the product, their step tables and
//! their validators.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::state::{ErrorMap, Fields, StepValidator};
use super::step::{StepDescriptor, StepId};
use super::validation::{is_strong_password, number, require, require_email, text};

/// A multi-step flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    Onboarding,
    Registration,
    AddProduct,
    RolesStaff,
    HelpSupport,
    Reports,
    ForgotPassword,
}

impl Flow {
    pub const ALL: [Flow; 7] = [
        Flow::Onboarding,
        Flow::Registration,
        Flow::AddProduct,
        Flow::RolesStaff,
        Flow::HelpSupport,
        Flow::Reports,
        Flow::ForgotPassword,
    ];

    /// Address prefix the step id is appended to.
    pub fn base(&self) -> &'static str {
        match self {
            Self::Onboarding => "onboarding",
            Self::Registration => "register",
            Self::AddProduct => "dashboard/add-product",
            Self::RolesStaff => "dashboard/roles-staff",
            Self::HelpSupport => "dashboard/help-support",
            Self::Reports => "dashboard/reports",
            Self::ForgotPassword => "forgot-password",
        }
    }

    pub fn steps(&self) -> Vec<StepDescriptor> {
        match self {
            Self::Onboarding => vec![
                step(dec!(1.0), "Welcome", "Welcome to IMS"),
                step(dec!(1.1), "Business Info", "Tell us about your business"),
                step(dec!(1.2), "Business Type", "What type of business?"),
                step(dec!(1.3), "Location", "Where are you located?"),
                step(dec!(2.0), "Goals", "What are your goals?"),
                step(dec!(2.1), "Features", "Key features you need"),
                step(dec!(2.2), "Team Size", "How big is your team?"),
                step(dec!(2.3), "Complete", "You're all set!"),
            ],
            Self::Registration => vec![
                step(dec!(3.0), "Account", "Create your account"),
                step(dec!(3.1), "Company", "Join your company"),
                step(dec!(3.2), "Review", "Review and submit"),
            ],
            Self::AddProduct => vec![
                step(dec!(19), "Basic Information", "Basic Product Information"),
                step(dec!(20), "Pricing & Costs", "Pricing & Costs"),
                step(dec!(21), "Inventory & Stock", "Inventory & Stock"),
                step(dec!(22), "Media & Images", "Media & Images"),
                step(dec!(23), "Variants & Options", "Variants & Options"),
                step(dec!(24), "Shipping & SEO", "Shipping & SEO"),
            ],
            Self::RolesStaff => vec![
                step(dec!(14), "Roles Overview", "Roles Overview"),
                step(dec!(15), "Create Role", "Create Role"),
                step(dec!(15.1), "Staff Management", "Staff Management"),
                step(dec!(15.2), "Permissions Setup", "Permissions Setup"),
            ],
            Self::HelpSupport => vec![
                step(dec!(16), "Help Center", "How can we help?"),
                step(dec!(17), "Support Contact", "Contact support"),
            ],
            Self::Reports => vec![
                step(dec!(25), "Report Selection", "Choose a report"),
                step(dec!(25.1), "Report Generation", "Generate report"),
            ],
            Self::ForgotPassword => vec![
                step(dec!(27), "Enter Email", "Forgot your password?"),
                step(dec!(27.1), "Verify Code", "Check your email"),
                step(dec!(27.2), "Reset Password", "Choose a new password"),
                step(dec!(27.3), "Success", "Password updated"),
            ],
        }
    }

    /// Check the fields of `step`. Steps without rules always pass.
    pub fn validate(&self, step: StepId, fields: &Fields) -> ErrorMap {
        match self {
            Self::AddProduct => validate_add_product(step, fields),
            Self::ForgotPassword => validate_forgot_password(step, fields),
            Self::Reports => validate_reports(step, fields),
            Self::Registration => crate::registration::validate_step(step, fields),
            Self::Onboarding | Self::RolesStaff | Self::HelpSupport => ErrorMap::new(),
        }
    }
}

impl StepValidator for Flow {
    fn validate(&self, step: StepId, fields: &Fields) -> ErrorMap {
        Flow::validate(self, step, fields)
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Onboarding => "onboarding",
            Self::Registration => "registration",
            Self::AddProduct => "add-product",
            Self::RolesStaff => "roles-staff",
            Self::HelpSupport => "help-support",
            Self::Reports => "reports",
            Self::ForgotPassword => "forgot-password",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Flow {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Flow::ALL
            .into_iter()
            .find(|flow| flow.to_string() == s.trim())
            .ok_or_else(|| format!("Unknown flow: {}", s))
    }
}

fn step(id: Decimal, label: &str, title: &str) -> StepDescriptor {
    StepDescriptor::new(StepId::new(id), label).with_title(title)
}

fn validate_add_product(step: StepId, fields: &Fields) -> ErrorMap {
    let mut errors = ErrorMap::new();
    let id = step.value();

    if id == dec!(19) {
        require(&mut errors, fields, "name", "Product name is required");
        require(&mut errors, fields, "sku", "SKU is required");
        require(&mut errors, fields, "category", "Category is required");
    } else if id == dec!(20) {
        if !number(fields, "cost_price").is_some_and(|n| n > Decimal::ZERO) {
            errors.insert("cost_price".into(), "Valid cost price is required".into());
        }
        if !number(fields, "selling_price").is_some_and(|n| n > Decimal::ZERO) {
            errors.insert("selling_price".into(), "Valid selling price is required".into());
        }
    } else if id == dec!(21) {
        let valid = number(fields, "quantity")
            .is_some_and(|n| n.fract().is_zero() && n >= Decimal::ZERO);
        if !valid {
            errors.insert("quantity".into(), "Valid quantity is required".into());
        }
    }

    errors
}

fn validate_forgot_password(step: StepId, fields: &Fields) -> ErrorMap {
    let mut errors = ErrorMap::new();
    let id = step.value();

    if id == dec!(27) {
        require_email(
            &mut errors,
            fields,
            "email",
            "Email is required",
            "Please enter a valid email address",
        );
    } else if id == dec!(27.1) {
        if require(&mut errors, fields, "verification_code", "Verification code is required")
            && text(fields, "verification_code").trim().chars().count() != 6
        {
            errors.insert(
                "verification_code".into(),
                "Verification code must be 6 digits".into(),
            );
        }
    } else if id == dec!(27.2) {
        let password = text(fields, "new_password");
        if password.is_empty() {
            errors.insert("new_password".into(), "New password is required".into());
        } else if password.chars().count() < 8 {
            errors.insert(
                "new_password".into(),
                "Password must be at least 8 characters".into(),
            );
        } else if !is_strong_password(&password) {
            errors.insert(
                "new_password".into(),
                "Password must contain uppercase, lowercase, and number".into(),
            );
        }
        if password != text(fields, "confirm_password") {
            errors.insert("confirm_password".into(), "Passwords do not match".into());
        }
    }

    errors
}

fn validate_reports(step: StepId, fields: &Fields) -> ErrorMap {
    let mut errors = ErrorMap::new();
    if step.value() == dec!(25) {
        require(&mut errors, fields, "report_type", "Please select a report type");
    }
    errors
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::wizard::state::WizardState;

    fn sid(s: &str) -> StepId {
        s.parse().unwrap()
    }

    fn fields(value: Value) -> Fields {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected an object"),
        }
    }

    #[test]
    fn every_flow_builds_a_valid_state() {
        for flow in Flow::ALL {
            let state = WizardState::new(flow.steps(), None).unwrap();
            assert_eq!(
                state.current(),
                flow.steps()[0].id,
                "{flow} should start at its first step"
            );
            assert!(flow.steps().iter().all(|s| s.title.is_some()));
        }
    }

    #[test]
    fn name_roundtrip() {
        for flow in Flow::ALL {
            assert_eq!(flow.to_string().parse::<Flow>().unwrap(), flow);
        }
        assert!("checkout".parse::<Flow>().is_err());
    }

    #[test]
    fn onboarding_walks_major_and_minor_steps() {
        let mut state = WizardState::new(Flow::Onboarding.steps(), None).unwrap();
        let mut visited = vec![state.current().to_string()];
        while state.advance(&Flow::Onboarding).unwrap().moved() {
            visited.push(state.current().to_string());
        }
        assert_eq!(visited, ["1.0", "1.1", "1.2", "1.3", "2.0", "2.1", "2.2", "2.3"]);
    }

    #[test]
    fn reports_selection_precedes_generation() {
        let mut state = WizardState::new(Flow::Reports.steps(), None).unwrap();
        assert_eq!(state.current(), sid("25"));
        assert!(state.advance(&Flow::Reports).is_err());
        state.update_field("report_type", json!("sales"));
        assert_eq!(state.advance(&Flow::Reports).unwrap().to, sid("25.1"));
    }

    #[test]
    fn add_product_basic_info() {
        let errors = Flow::AddProduct.validate(sid("19"), &Fields::new());
        assert_eq!(
            errors.keys().map(String::as_str).collect::<Vec<_>>(),
            ["category", "name", "sku"]
        );

        let ok = fields(json!({"name": "Widget", "sku": "W-1", "category": "tools"}));
        assert!(Flow::AddProduct.validate(sid("19"), &ok).is_empty());
    }

    #[test]
    fn add_product_pricing_needs_positive_numbers() {
        let bad = fields(json!({"cost_price": "0", "selling_price": "abc"}));
        let errors = Flow::AddProduct.validate(sid("20"), &bad);
        assert_eq!(errors["cost_price"], "Valid cost price is required");
        assert_eq!(errors["selling_price"], "Valid selling price is required");

        let ok = fields(json!({"cost_price": "4.25", "selling_price": 9}));
        assert!(Flow::AddProduct.validate(sid("20"), &ok).is_empty());
    }

    #[test]
    fn add_product_quantity() {
        let check =
            |v: Value| Flow::AddProduct.validate(sid("21"), &fields(json!({"quantity": v})));
        assert!(check(json!("0")).is_empty());
        assert!(check(json!(12)).is_empty());
        assert!(!check(json!("-1")).is_empty());
        assert!(!check(json!("1.5")).is_empty());
        assert!(!check(json!("")).is_empty());

        // Later steps carry no rules.
        assert!(Flow::AddProduct.validate(sid("22"), &Fields::new()).is_empty());
    }

    #[test]
    fn forgot_password_rules() {
        let v = |step: &str, value: Value| Flow::ForgotPassword.validate(sid(step), &fields(value));

        assert_eq!(v("27", json!({}))["email"], "Email is required");
        assert_eq!(v("27", json!({"email": "x"}))["email"], "Please enter a valid email address");
        assert!(v("27", json!({"email": "a@x.com"})).is_empty());

        assert_eq!(
            v("27.1", json!({"verification_code": "123"}))["verification_code"],
            "Verification code must be 6 digits"
        );
        assert!(v("27.1", json!({"verification_code": "123456"})).is_empty());

        let weak = v("27.2", json!({"new_password": "password1", "confirm_password": "password1"}));
        assert_eq!(weak["new_password"], "Password must contain uppercase, lowercase, and number");
        assert!(!weak.contains_key("confirm_password"));

        let mismatch = v(
            "27.2",
            json!({"new_password": "Secret123", "confirm_password": "Secret124"}),
        );
        assert_eq!(mismatch.len(), 1);
        assert_eq!(mismatch["confirm_password"], "Passwords do not match");

        assert!(v("27.3", json!({})).is_empty());
    }

    #[test]
    fn flows_without_rules_accept_anything() {
        for flow in [Flow::Onboarding, Flow::RolesStaff, Flow::HelpSupport] {
            for s in flow.steps() {
                assert!(flow.validate(s.id, &Fields::new()).is_empty());
            }
        }
    }
}
