//! Well-known store keys.

/// `CompanyRecord[]` owned by the approval store.
pub const COMPANIES: &str = "companies";
/// `UserCredential[]` owned by the approval store.
pub const USERS: &str = "users";
/// `"true"` while a session is signed in.
pub const IS_AUTHENTICATED: &str = "isAuthenticated";
/// Public fields of the signed-in identity.
pub const CURRENT_USER: &str = "currentUser";
