//! Company approval workflow — registration, admin approve/deny, and the
//! sign-in gate that keeps unapproved accounts out.

pub mod model;
pub mod store;

pub use model::{
    AuthProvider, CompanyRecord, CurrentUser, Member, NewCredential, PendingRequest, Role,
    UserCredential,
};
pub use store::ApprovalStore;
