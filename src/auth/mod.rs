//! Authentication and authorization for the Admitpath backend.
//!
//! Covers the account model, Argon2id password hashing, the dual-secret JWT
//! scheme, the signup/login/refresh/approval service, and the axum
//! middleware that guards routes.

pub mod account;
pub mod hashing;
pub mod middleware;
pub mod service;
pub mod token;

pub use account::{Account, ApprovalState, Role};
pub use middleware::{AuthContext, RefreshContext};
pub use service::AuthService;
pub use token::{Claims, TokenIssuer, TokenPair};
