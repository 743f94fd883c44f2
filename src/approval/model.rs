//! Identity and company data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of an account within its company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Clerk,
    Other,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Admin, Role::Manager, Role::Clerk, Role::Other];

    /// Admins sign in without company approval.
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Manager => write!(f, "manager"),
            Self::Clerk => write!(f, "clerk"),
            Self::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "manager" => Ok(Self::Manager),
            "clerk" => Ok(Self::Clerk),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// How an account signs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[default]
    Password,
    Google,
    Apple,
}

impl std::fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Password => write!(f, "password"),
            Self::Google => write!(f, "google"),
            Self::Apple => write!(f, "apple"),
        }
    }
}

impl std::str::FromStr for AuthProvider {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "password" => Ok(Self::Password),
            "google" => Ok(Self::Google),
            "apple" => Ok(Self::Apple),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// Registration input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCredential {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub role: Role,
}

/// A stored account.
///
/// Stored under the `"users"` key as part of a JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCredential {
    pub id: Uuid,
    pub email: String,
    /// Stored as entered; hashing is out of scope for the local store.
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: String,
    pub role: Role,
    #[serde(default)]
    pub provider: AuthProvider,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl UserCredential {
    /// Public projection kept in the session.
    pub fn to_current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            company: self.company.clone(),
            role: self.role,
            provider: self.provider,
        }
    }
}

/// The signed-in identity. Never carries the password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    pub role: Role,
    #[serde(default)]
    pub provider: AuthProvider,
}

impl CurrentUser {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// An approved account of a company.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub email: String,
    pub role: Role,
    pub approved: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
}

/// A registration waiting for an admin decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<DateTime<Utc>>,
}

/// A company with its approved members and open requests.
///
/// Stored under the `"companies"` key as part of a JSON array. An email is in
/// at most one of `members` and `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyRecord {
    pub name: String,
    #[serde(default, alias = "users")]
    pub members: Vec<Member>,
    #[serde(default)]
    pub pending: Vec<PendingRequest>,
}

impl CompanyRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Case-insensitive name match.
    pub fn matches(&self, name: &str) -> bool {
        same_key(&self.name, name)
    }

    pub fn is_member(&self, email: &str) -> bool {
        self.members.iter().any(|m| same_key(&m.email, email))
    }

    pub fn pending_request(&self, email: &str) -> Option<&PendingRequest> {
        self.pending.iter().find(|p| same_key(&p.email, email))
    }
}

/// Email and company-name comparison: trimmed, case-insensitive.
pub(crate) fn same_key(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
