//! ApprovalStore — owns the `"users"` and `"companies"` keys and every
//! registration, approval and sign-in decision made against them.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{AuthError, StoreError};
use crate::store::{KeyValueStore, keys, read_json, write_json};
use crate::wizard::validation::is_valid_email;

use super::model::{
    AuthProvider, CompanyRecord, Member, NewCredential, PendingRequest, Role, UserCredential,
    same_key,
};

/// Registration and approval state over a key-value store.
///
/// Each operation is one read-modify-write of the keys it touches.
#[derive(Clone)]
pub struct ApprovalStore {
    kv: Arc<dyn KeyValueStore>,
    approved_role: Role,
}

impl ApprovalStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            approved_role: Role::Manager,
        }
    }

    /// Role granted on approval. Defaults to `Manager` whatever role was
    /// requested at registration.
    pub fn with_approved_role(mut self, role: Role) -> Self {
        self.approved_role = role;
        self
    }

    pub fn approved_role(&self) -> Role {
        self.approved_role
    }

    /// The underlying key-value store.
    pub fn kv(&self) -> &Arc<dyn KeyValueStore> {
        &self.kv
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Create an account. Non-admins also get a pending request at their
    /// company, creating the company record if needed.
    pub fn register(&self, new: NewCredential) -> Result<UserCredential, AuthError> {
        let email = new.email.trim().to_string();
        let company = new.company.trim().to_string();

        if !new.role.is_admin() && company.is_empty() {
            return Err(AuthError::MissingCompany {
                role: new.role.to_string(),
            });
        }

        let mut users = self.users()?;
        if users.iter().any(|u| same_key(&u.email, &email)) {
            debug!(email = %email, "Registration rejected, email taken");
            return Err(AuthError::DuplicateEmail { email });
        }

        let credential = UserCredential {
            id: Uuid::new_v4(),
            email: email.clone(),
            password: new.password,
            first_name: new.first_name.trim().to_string(),
            last_name: new.last_name.trim().to_string(),
            company: company.clone(),
            role: new.role,
            provider: AuthProvider::Password,
            created_at: Utc::now(),
        };
        users.push(credential.clone());

        if new.role.is_admin() {
            write_json(self.kv.as_ref(), keys::USERS, &users)?;
            info!(email = %email, "Admin registered");
            return Ok(credential);
        }

        // Both collections are read before either is written, and the
        // companies write is undone if the users write fails.
        let previous = self.kv.get(keys::COMPANIES)?;
        let mut companies = self.companies()?;
        let index = match companies.iter().position(|c| c.matches(&company)) {
            Some(index) => index,
            None => {
                info!(company = %company, "Company record created");
                companies.push(CompanyRecord::new(company.clone()));
                companies.len() - 1
            }
        };

        let record = &mut companies[index];
        if !record.is_member(&email) && record.pending_request(&email).is_none() {
            record.pending.push(PendingRequest {
                email: email.clone(),
                role: new.role,
                requested_at: Some(Utc::now()),
            });
        }
        write_json(self.kv.as_ref(), keys::COMPANIES, &companies)?;

        if let Err(e) = write_json(self.kv.as_ref(), keys::USERS, &users) {
            warn!(email = %email, error = %e, "Registration failed, restoring companies");
            match previous {
                Some(raw) => self.kv.set(keys::COMPANIES, &raw)?,
                None => {
                    self.kv.remove(keys::COMPANIES)?;
                }
            }
            return Err(e.into());
        }

        info!(
            email = %email,
            company = %company,
            role = %new.role,
            "Registration pending approval"
        );
        Ok(credential)
    }

    /// Move a pending request into the company's members.
    ///
    /// Returns the new member, or `None` when there was no pending request to
    /// resolve (already approved or denied, or unknown company).
    pub fn approve(&self, company: &str, email: &str) -> Result<Option<Member>, AuthError> {
        let mut companies = self.companies()?;

        let Some(record) = companies.iter_mut().find(|c| c.matches(company)) else {
            debug!(company = %company, "Approve ignored, unknown company");
            return Ok(None);
        };

        let Some(request) = take_pending(record, email) else {
            debug!(company = %company, email = %email, "Approve ignored, no pending request");
            return Ok(None);
        };

        let member = if record.is_member(&request.email) {
            warn!(
                company = %company,
                email = %email,
                "Pending request for an existing member dropped"
            );
            None
        } else {
            let member = Member {
                email: request.email,
                role: self.approved_role,
                approved: true,
                approved_at: Some(Utc::now()),
            };
            record.members.push(member.clone());
            Some(member)
        };

        write_json(self.kv.as_ref(), keys::COMPANIES, &companies)?;

        if let Some(ref m) = member {
            info!(company = %company, email = %m.email, role = %m.role, "Request approved");
        }
        Ok(member)
    }

    /// Drop a pending request without granting membership.
    ///
    /// Returns the removed request, or `None` when there was nothing to deny.
    pub fn deny(&self, company: &str, email: &str) -> Result<Option<PendingRequest>, AuthError> {
        let mut companies = self.companies()?;

        let Some(record) = companies.iter_mut().find(|c| c.matches(company)) else {
            debug!(company = %company, "Deny ignored, unknown company");
            return Ok(None);
        };

        let Some(request) = take_pending(record, email) else {
            debug!(company = %company, email = %email, "Deny ignored, no pending request");
            return Ok(None);
        };

        write_json(self.kv.as_ref(), keys::COMPANIES, &companies)?;
        info!(company = %company, email = %request.email, "Request denied");
        Ok(Some(request))
    }

    /// Check credentials and the approval gate.
    ///
    /// Wrong email or password → `InvalidCredentials`. A non-admin who is not
    /// a member of their company → `PendingApproval`.
    pub fn authenticate(&self, email: &str, password: &str) -> Result<UserCredential, AuthError> {
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let user = self
            .users()?
            .into_iter()
            .find(|u| same_key(&u.email, email) && u.password == password)
            .ok_or_else(|| {
                debug!(email = %email, "Sign-in rejected, bad credentials");
                AuthError::InvalidCredentials
            })?;

        if user.role.is_admin() {
            return Ok(user);
        }

        let approved = self
            .company(&user.company)?
            .is_some_and(|c| c.is_member(&user.email));
        if !approved {
            debug!(
                email = %user.email,
                company = %user.company,
                "Sign-in blocked, pending approval"
            );
            return Err(AuthError::PendingApproval {
                email: user.email,
                company: user.company,
            });
        }

        Ok(user)
    }

    /// Social sign-in: return the account for `email`, creating an admin
    /// account without a password the first time.
    pub fn find_or_create_social(
        &self,
        provider: AuthProvider,
        email: &str,
    ) -> Result<UserCredential, AuthError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Err(AuthError::InvalidEmail {
                email: email.to_string(),
            });
        }

        let mut users = self.users()?;
        if let Some(existing) = users.iter().find(|u| same_key(&u.email, email)) {
            return Ok(existing.clone());
        }

        let credential = UserCredential {
            id: Uuid::new_v4(),
            email: email.to_string(),
            password: String::new(),
            first_name: "New".to_string(),
            last_name: "User".to_string(),
            company: String::new(),
            role: Role::Admin,
            provider,
            created_at: Utc::now(),
        };
        users.push(credential.clone());
        write_json(self.kv.as_ref(), keys::USERS, &users)?;

        info!(email = %email, provider = %provider, "Social account created");
        Ok(credential)
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn users(&self) -> Result<Vec<UserCredential>, StoreError> {
        Ok(read_json(self.kv.as_ref(), keys::USERS)?.unwrap_or_default())
    }

    pub fn user(&self, email: &str) -> Result<Option<UserCredential>, StoreError> {
        Ok(self.users()?.into_iter().find(|u| same_key(&u.email, email)))
    }

    pub fn companies(&self) -> Result<Vec<CompanyRecord>, StoreError> {
        Ok(read_json(self.kv.as_ref(), keys::COMPANIES)?.unwrap_or_default())
    }

    pub fn company(&self, name: &str) -> Result<Option<CompanyRecord>, StoreError> {
        Ok(self.companies()?.into_iter().find(|c| c.matches(name)))
    }

    pub fn pending_requests(&self, company: &str) -> Result<Vec<PendingRequest>, StoreError> {
        Ok(self.company(company)?.map(|c| c.pending).unwrap_or_default())
    }

    pub fn members(&self, company: &str) -> Result<Vec<Member>, StoreError> {
        Ok(self.company(company)?.map(|c| c.members).unwrap_or_default())
    }
}

/// Remove every pending entry for `email`, returning the first.
fn take_pending(record: &mut CompanyRecord, email: &str) -> Option<PendingRequest> {
    let position = record.pending.iter().position(|p| same_key(&p.email, email))?;
    let request = record.pending.remove(position);
    record.pending.retain(|p| !same_key(&p.email, email));
    Some(request)
}
