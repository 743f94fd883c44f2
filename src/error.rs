//! Error types for the inventory core.

use crate::wizard::{ErrorMap, StepId};

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl Error {
    /// Flat classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Store(_) => ErrorKind::Store,
            Self::Wizard(e) => e.kind(),
            Self::Auth(e) => e.kind(),
        }
    }
}

/// Flat error classification, for screens that only need to pick a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ValidationFailed,
    UnknownStep,
    InvalidFlow,
    DuplicateEmail,
    InvalidCredentials,
    PendingApproval,
    MissingCompany,
    InvalidEmail,
    NotAuthenticated,
    Forbidden,
    Store,
    Config,
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Key-value store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Wizard navigation errors.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Validation failed for {} field(s)", .errors.len())]
    ValidationFailed { errors: ErrorMap },

    #[error("Unknown step {step}")]
    UnknownStep { step: StepId },

    #[error("A flow needs at least one step")]
    EmptyFlow,

    #[error("Step {step} is declared more than once")]
    DuplicateStep { step: StepId },
}

impl WizardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ValidationFailed { .. } => ErrorKind::ValidationFailed,
            Self::UnknownStep { .. } => ErrorKind::UnknownStep,
            Self::EmptyFlow | Self::DuplicateStep { .. } => ErrorKind::InvalidFlow,
        }
    }

    /// Per-field messages when this is a validation failure.
    pub fn field_errors(&self) -> Option<&ErrorMap> {
        match self {
            Self::ValidationFailed { errors } => Some(errors),
            _ => None,
        }
    }
}

/// Identity and approval errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Email {email} is already registered")]
    DuplicateEmail { email: String },

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Account {email} is pending approval at {company}")]
    PendingApproval { email: String, company: String },

    #[error("A company is required for role {role}")]
    MissingCompany { role: String },

    #[error("Invalid email address: {email}")]
    InvalidEmail { email: String },

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("{email} is not allowed to {action}")]
    Forbidden { email: String, action: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DuplicateEmail { .. } => ErrorKind::DuplicateEmail,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::PendingApproval { .. } => ErrorKind::PendingApproval,
            Self::MissingCompany { .. } => ErrorKind::MissingCompany,
            Self::InvalidEmail { .. } => ErrorKind::InvalidEmail,
            Self::NotAuthenticated => ErrorKind::NotAuthenticated,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// The single line shown on the sign-in and registration screens.
    ///
    /// Wrong credentials and an unapproved account must read differently.
    pub fn user_message(&self) -> String {
        match self {
            Self::DuplicateEmail { .. } => "Email is already registered. Please sign in.".into(),
            Self::InvalidCredentials => "Invalid email or password".into(),
            Self::PendingApproval { .. } => {
                "Your account is pending approval by your company admin.".into()
            }
            Self::MissingCompany { .. } => "Please enter your company name".into(),
            Self::InvalidEmail { .. } => "Enter a valid email address".into(),
            Self::NotAuthenticated => "Please sign in to continue".into(),
            Self::Forbidden { .. } => "You do not have access to this page".into(),
            Self::Store(_) => "Something went wrong. Please try again.".into(),
        }
    }
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
