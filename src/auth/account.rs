//! Account domain models and data structures.
//!
//! Defines the core account entity, its role and approval-state lifecycles,
//! and the request/response DTOs for the auth endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::{AccountId, FamilyId};

static EMAIL_REGEX: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("EMAIL_REGEX should be a valid pattern")
});

/// Account role on the admissions platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    Student,
    Parent,
    Consultant,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Parent => "parent",
            Role::Consultant => "consultant",
            Role::Admin => "admin",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "parent" => Ok(Role::Parent),
            "consultant" => Ok(Role::Consultant),
            "admin" => Ok(Role::Admin),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}

/// Error returned when role parsing fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid role: {0}")]
pub struct RoleParseError(pub String);

/// Administrative approval lifecycle. Meaningful only for consultants;
/// every other role stays at `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalState {
    None,
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalState::None => "none",
            ApprovalState::Pending => "pending",
            ApprovalState::Approved => "approved",
            ApprovalState::Rejected => "rejected",
        }
    }
}

impl Display for ApprovalState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApprovalState {
    type Err = ApprovalStateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ApprovalState::None),
            "pending" => Ok(ApprovalState::Pending),
            "approved" => Ok(ApprovalState::Approved),
            "rejected" => Ok(ApprovalState::Rejected),
            other => Err(ApprovalStateParseError(other.to_string())),
        }
    }
}

/// Error returned when approval state parsing fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid approval state: {0}")]
pub struct ApprovalStateParseError(pub String);

/// Stored representation of an account.
///
/// The password hash is never part of this struct; it is fetched separately
/// via `AccountRepository::get_account_with_password` and stays inside the
/// auth service.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub approval_state: ApprovalState,
    /// The single live refresh token for this account; overwritten on every
    /// login and refresh, which is what invalidates the previous one.
    pub current_refresh_token: Option<String>,
    pub family_id: Option<FamilyId>,
    pub school_name: Option<String>,
    pub grade: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Emails are stored as given (case-sensitive); only surrounding
    /// whitespace is stripped.
    pub fn normalize_email(email: &str) -> String {
        email.trim().to_string()
    }
}

/// New account creation payload.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: Role,
    pub approval_state: ApprovalState,
    pub family_id: Option<FamilyId>,
    pub school_name: Option<String>,
    pub grade: Option<i64>,
}

/// Request to create a new account.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(regex(path = *EMAIL_REGEX, message = "must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "must be at least 8 characters"))]
    pub password: String,
    #[validate(length(min = 1, message = "must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub family_id: Option<FamilyId>,
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub grade: Option<i64>,
}

/// Account authentication credentials.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public-safe projection of an account. Never carries the password hash or
/// the current refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: AccountId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub approval_state: ApprovalState,
    pub family_id: Option<FamilyId>,
    pub school_name: Option<String>,
    pub grade: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
            approval_state: account.approval_state,
            family_id: account.family_id,
            school_name: account.school_name,
            grade: account.grade,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Request to record an administrative approval decision for a consultant.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalDecisionRequest {
    pub state: ApprovalDecision,
}

/// The two states an administrator can move a pending consultant into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

impl From<ApprovalDecision> for ApprovalState {
    fn from(decision: ApprovalDecision) -> Self {
        match decision {
            ApprovalDecision::Approved => ApprovalState::Approved,
            ApprovalDecision::Rejected => ApprovalState::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_account() -> Account {
        Account {
            id: AccountId::new(),
            email: "student@example.com".to_string(),
            name: "Test Student".to_string(),
            role: Role::Student,
            approval_state: ApprovalState::None,
            current_refresh_token: Some("opaque-refresh-token".to_string()),
            family_id: None,
            school_name: Some("Riverside High".to_string()),
            grade: Some(11),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn role_round_trip() {
        for (input, expected) in [
            ("student", Role::Student),
            ("parent", Role::Parent),
            ("consultant", Role::Consultant),
            ("admin", Role::Admin),
        ] {
            let parsed = input.parse::<Role>().unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.to_string(), input);
        }

        let err = "counselor".parse::<Role>().unwrap_err();
        assert_eq!(err.0, "counselor");
    }

    #[test]
    fn approval_state_round_trip() {
        for (input, expected) in [
            ("none", ApprovalState::None),
            ("pending", ApprovalState::Pending),
            ("approved", ApprovalState::Approved),
            ("rejected", ApprovalState::Rejected),
        ] {
            let parsed = input.parse::<ApprovalState>().unwrap();
            assert_eq!(parsed, expected);
            assert_eq!(parsed.to_string(), input);
        }

        assert!("granted".parse::<ApprovalState>().is_err());
    }

    #[test]
    fn email_normalization_preserves_case() {
        assert_eq!(Account::normalize_email("  Mixed.Case@Example.com  "), "Mixed.Case@Example.com");
    }

    #[test]
    fn account_response_omits_refresh_token() {
        let account = sample_account();
        let response: AccountResponse = account.into();
        let json = serde_json::to_value(&response).unwrap();

        assert!(json.get("currentRefreshToken").is_none());
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["email"], "student@example.com");
        assert_eq!(json["role"], "student");
    }

    #[test]
    fn signup_request_role_defaults_to_none() {
        let json = r#"{
            "email": "new@example.com",
            "password": "long-enough-pw",
            "name": "New User"
        }"#;

        let request: SignupRequest = serde_json::from_str(json).unwrap();
        assert!(request.role.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn signup_request_validation() {
        let mut request = SignupRequest {
            email: "ok@example.com".to_string(),
            password: "long-enough-pw".to_string(),
            name: "Someone".to_string(),
            role: None,
            family_id: None,
            school_name: None,
            grade: None,
        };
        assert!(request.validate().is_ok());

        request.password = "short".to_string();
        assert!(request.validate().is_err());

        request.password = "long-enough-pw".to_string();
        request.email = "not-an-email".to_string();
        assert!(request.validate().is_err());

        request.email = "ok@example.com".to_string();
        request.name = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn approval_decision_maps_to_state() {
        assert_eq!(ApprovalState::from(ApprovalDecision::Approved), ApprovalState::Approved);
        assert_eq!(ApprovalState::from(ApprovalDecision::Rejected), ApprovalState::Rejected);
    }
}
