//! Session — the signed-in identity and route gating on top of
//! [`ApprovalStore`].

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::approval::{
    ApprovalStore, AuthProvider, CurrentUser, Member, PendingRequest, UserCredential,
};
use crate::error::{AuthError, StoreError};
use crate::store::{KeyValueStore, keys, read_json, write_json};

/// Who may open a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    Public,
    Authenticated,
    Admin,
}

/// Owns the `"isAuthenticated"` and `"currentUser"` keys.
#[derive(Clone)]
pub struct Session {
    kv: Arc<dyn KeyValueStore>,
    approvals: ApprovalStore,
}

impl Session {
    /// Share the approval store's backend.
    pub fn new(approvals: ApprovalStore) -> Self {
        Self {
            kv: Arc::clone(approvals.kv()),
            approvals,
        }
    }

    pub fn approvals(&self) -> &ApprovalStore {
        &self.approvals
    }

    /// Password sign-in.
    pub fn login(&self, email: &str, password: &str) -> Result<CurrentUser, AuthError> {
        let credential = self.approvals.authenticate(email, password)?;
        self.start(&credential)
    }

    /// Google/Apple sign-in. Unknown emails get a fresh admin account.
    pub fn sign_in_with_provider(
        &self,
        provider: AuthProvider,
        email: &str,
    ) -> Result<CurrentUser, AuthError> {
        let credential = self.approvals.find_or_create_social(provider, email)?;
        self.start(&credential)
    }

    /// Persist `credential`'s public fields as the signed-in identity.
    pub(crate) fn start(&self, credential: &UserCredential) -> Result<CurrentUser, AuthError> {
        let user = credential.to_current_user();
        write_json(self.kv.as_ref(), keys::CURRENT_USER, &user)?;
        self.kv.set(keys::IS_AUTHENTICATED, "true")?;
        info!(email = %user.email, role = %user.role, provider = %user.provider, "Signed in");
        Ok(user)
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        self.kv.remove(keys::IS_AUTHENTICATED)?;
        if self.kv.remove(keys::CURRENT_USER)? {
            info!("Signed out");
        }
        Ok(())
    }

    /// The signed-in identity. A missing flag or unreadable record is no user.
    pub fn current_user(&self) -> Result<Option<CurrentUser>, StoreError> {
        if self.kv.get(keys::IS_AUTHENTICATED)?.as_deref() != Some("true") {
            return Ok(None);
        }
        match read_json::<CurrentUser>(self.kv.as_ref(), keys::CURRENT_USER) {
            Ok(user) => Ok(user),
            Err(StoreError::Json(e)) => {
                warn!(error = %e, "Stored session is unreadable, treating as signed out");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    pub fn is_authenticated(&self) -> Result<bool, StoreError> {
        Ok(self.current_user()?.is_some())
    }

    /// Check that the current identity may open a route.
    ///
    /// Returns the signed-in user, or `None` for a public route visited while
    /// signed out.
    pub fn guard(&self, access: RouteAccess) -> Result<Option<CurrentUser>, AuthError> {
        let user = self.current_user()?;
        match (access, user) {
            (RouteAccess::Public, user) => Ok(user),
            (_, None) => {
                debug!(access = ?access, "Route blocked, not signed in");
                Err(AuthError::NotAuthenticated)
            }
            (RouteAccess::Authenticated, Some(user)) => Ok(Some(user)),
            (RouteAccess::Admin, Some(user)) if user.role.is_admin() => Ok(Some(user)),
            (RouteAccess::Admin, Some(user)) => {
                debug!(email = %user.email, "Route blocked, admin only");
                Err(AuthError::Forbidden {
                    email: user.email,
                    action: "open the admin console".into(),
                })
            }
        }
    }

    // ── Admin console ───────────────────────────────────────────────

    /// Pending requests at the signed-in admin's company.
    pub fn pending_approvals(&self) -> Result<Vec<PendingRequest>, AuthError> {
        let company = self.admin_company("review pending approvals")?;
        Ok(self.approvals.pending_requests(&company)?)
    }

    /// Approve `email` at the signed-in admin's company.
    pub fn approve_pending(&self, email: &str) -> Result<Option<Member>, AuthError> {
        let company = self.admin_company("approve requests")?;
        self.approvals.approve(&company, email)
    }

    /// Deny `email` at the signed-in admin's company.
    pub fn deny_pending(&self, email: &str) -> Result<Option<PendingRequest>, AuthError> {
        let company = self.admin_company("deny requests")?;
        self.approvals.deny(&company, email)
    }

    fn admin_company(&self, action: &str) -> Result<String, AuthError> {
        let Some(admin) = self.guard(RouteAccess::Admin)? else {
            return Err(AuthError::NotAuthenticated);
        };
        if admin.company.trim().is_empty() {
            return Err(AuthError::MissingCompany {
                role: admin.role.to_string(),
            });
        }
        debug!(email = %admin.email, company = %admin.company, action = %action, "Admin action");
        Ok(admin.company)
    }
}
