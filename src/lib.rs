//! IMS core — step-wizard navigation and local company-approval sign-in.

pub mod approval;
pub mod config;
pub mod error;
pub mod registration;
pub mod routing;
pub mod session;
pub mod store;
pub mod wizard;
